mod common;

use api_lib::web::api_router;
use common::{FakeContent, StateBuilder};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn get_json(url: String) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn chapters_are_listed_and_searchable() {
    let base = common::serve(api_router(StateBuilder::default().build())).await;

    let (status, all) = get_json(format!("{}/chapters", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[0]["revelation"], "مكية");
    assert_eq!(all[0]["shows_invocation_header"], false);

    let (_, by_name) = get_json(format!("{}/chapters?q=البقرة", base)).await;
    assert_eq!(by_name.as_array().unwrap().len(), 1);
    assert_eq!(by_name[0]["id"], 2);

    let (_, by_number) = get_json(format!("{}/chapters?q=36", base)).await;
    assert_eq!(by_number[0]["name"], "يس");
}

#[tokio::test]
async fn chapter_list_failure_is_a_bad_gateway() {
    let state = StateBuilder {
        content: FakeContent {
            fail_list: true,
            ..FakeContent::default()
        },
        ..StateBuilder::default()
    }
    .build();
    let base = common::serve(api_router(state)).await;

    let response = reqwest::get(format!("{}/chapters", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn chapter_content_and_commentary() {
    let base = common::serve(api_router(StateBuilder::default().build())).await;

    let (status, content) = get_json(format!("{}/chapters/1", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content["chapter"]["name"], "الفاتحة");
    assert_eq!(content["verses"].as_array().unwrap().len(), 3);
    assert_eq!(content["verses"][1]["number_in_chapter"], 2);
    assert_eq!(content["verses"][1]["prostration"], Value::Null);

    let (status, _) = get_json(format!("{}/chapters/99", base)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, commentary) = get_json(format!("{}/chapters/1/verses/2/commentary", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(commentary["text"], "تفسير 1:2");
    assert_eq!(commentary["verse_number"], 2);
}

#[tokio::test]
async fn recitation_check_grades_transcripts() {
    let base = common::serve(api_router(StateBuilder::default().build())).await;
    let client = reqwest::Client::new();

    let check = |transcript: &'static str| {
        let client = client.clone();
        let url = format!("{}/recitation/check", base);
        async move {
            client
                .post(url)
                .json(&json!({
                    "target_text": "قُلْ هُوَ اللَّهُ أَحَدٌ",
                    "transcript": transcript,
                }))
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    let exact = check("قل هو الله أحد").await;
    assert_eq!(exact["verdict"], "correct");
    assert_eq!(exact["feedback"], "أحسنت! تلاوة صحيحة");

    let silent = check("").await;
    assert_eq!(silent["verdict"], "incorrect");

    let unrelated = check("صباح الخير").await;
    assert_eq!(unrelated["verdict"], "incorrect");
    assert_eq!(unrelated["matched_words"], 0);
    assert_eq!(unrelated["target_words"], 4);
}

#[tokio::test]
async fn last_read_is_absent_until_recorded() {
    let state = StateBuilder::default().build();
    let base = common::serve(api_router(state.clone())).await;

    let response = reqwest::get(format!("{}/last-read", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    state
        .preferences
        .lock()
        .await
        .record_last_read(&common::chapter(18, "الكهف"))
        .await
        .unwrap();

    let (status, marker) = get_json(format!("{}/last-read", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marker["chapter_id"], 18);
    assert_eq!(marker["chapter_name"], "الكهف");
}
