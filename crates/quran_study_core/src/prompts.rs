//! Instruction templates for the AI study tools.
//!
//! Every tool maps to a localized title and a deterministic prompt. Verse tools embed
//! the verse text and chapter name, chapter tools embed only the chapter name.

use crate::domain::{Chapter, Verse};
use crate::ports::ResponseMode;

/// Number of questions requested from the quiz tool.
pub const QUIZ_LENGTH: usize = 3;

/// The study tools offered on a verse or a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyTool {
    Reflection,
    RecitationRules,
    Vocabulary,
    Supplication,
    ActionSteps,
    Grammar,
    HistoricalContext,
    SimilarVerses,
    ChildFriendly,
    ChapterSummary,
    Question(String),
    Quiz,
}

impl StudyTool {
    /// Whether the tool is about a single verse rather than the whole chapter.
    pub fn needs_verse(&self) -> bool {
        !matches!(self, StudyTool::ChapterSummary | StudyTool::Quiz)
    }

    pub fn mode(&self) -> ResponseMode {
        match self {
            StudyTool::Quiz => ResponseMode::Json,
            _ => ResponseMode::Text,
        }
    }

    pub fn title(&self, chapter: &Chapter) -> String {
        match self {
            StudyTool::Reflection => "تدبر ومساعد قرآني".to_string(),
            StudyTool::RecitationRules => "أحكام التجويد".to_string(),
            StudyTool::Vocabulary => "غريب القرآن والمفردات".to_string(),
            StudyTool::Supplication => "دعاء مستوحى".to_string(),
            StudyTool::ActionSteps => "العمل بالآية".to_string(),
            StudyTool::Grammar => "الإعراب النحوي".to_string(),
            StudyTool::HistoricalContext => "أسباب النزول".to_string(),
            StudyTool::SimilarVerses => "المتشابهات اللفظية".to_string(),
            StudyTool::ChildFriendly => "المفسر الصغير".to_string(),
            StudyTool::ChapterSummary => format!("ملخص سورة {}", chapter.name),
            StudyTool::Question(_) => "سؤال عن الآية".to_string(),
            StudyTool::Quiz => format!("اختبار: سورة {}", chapter.name),
        }
    }
}

/// A ready-to-send instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyPrompt {
    pub title: String,
    pub text: String,
    pub mode: ResponseMode,
}

fn verse_context(verse: &Verse, chapter: &Chapter) -> String {
    format!("الآية: \"{}\" (سورة {})", verse.text, chapter.name)
}

fn verse_instruction(tool: &StudyTool) -> Option<&'static str> {
    let instruction = match tool {
        StudyTool::Reflection => "بصفتك مساعداً للتدبر، اشرح الآية شرحاً مبسطاً مع 3 نقاط عملية للتدبر:",
        StudyTool::RecitationRules => "استخرج أحكام التجويد من هذه الآية بشكل قائمة واضحة:",
        StudyTool::Vocabulary => "اشرح المفردات الصعبة (غريب القرآن) في هذه الآية:",
        StudyTool::Supplication => "صغ دعاءً خاشعاً مستوحى من معاني هذه الآية:",
        StudyTool::ActionSteps => "اقترح 3 خطوات عملية تطبيقية يمكن تنفيذها اليوم بناءً على هذه الآية:",
        StudyTool::Grammar => "أعرب هذه الآية إعرباً ميسراً يوضح مواقع الكلمات الرئيسية:",
        StudyTool::HistoricalContext => "ما سبب نزول هذه الآية أو سياقها التاريخي؟",
        StudyTool::SimilarVerses => "استخرج الآيات المتشابهة لفظياً مع هذه الآية لضبط الحفظ:",
        StudyTool::ChildFriendly => "اشرح هذه الآية لطفل عمره 7 سنوات بأسلوب قصصي يبدأ بـ \"يا بطل\":",
        StudyTool::ChapterSummary | StudyTool::Question(_) | StudyTool::Quiz => return None,
    };
    Some(instruction)
}

/// Builds the prompt for `tool`. Returns `None` when there is nothing to ask: a verse
/// tool without a verse, or a blank free-form question.
pub fn build_prompt(tool: &StudyTool, chapter: &Chapter, verse: Option<&Verse>) -> Option<StudyPrompt> {
    let text = match tool {
        StudyTool::ChapterSummary => format!(
            "لخص سورة {} (محاورها، سبب التسمية، والدروس) في نقاط.",
            chapter.name
        ),
        StudyTool::Quiz => format!(
            "أنشئ اختباراً من {} أسئلة اختيار من متعدد عن سورة {} بتنسيق JSON: [{{\"question\": \"\", \"options\": [], \"correctIndex\": 0}}]",
            QUIZ_LENGTH, chapter.name
        ),
        StudyTool::Question(question) => {
            let question = question.trim();
            if question.is_empty() {
                return None;
            }
            format!(
                "بصفتك عالماً ومساعداً قرآنياً، أجب عن السؤال التالي المتعلق بالآية: {} \n\nالسؤال: {}",
                verse_context(verse?, chapter),
                question
            )
        }
        verse_tool => format!(
            "{} {}",
            verse_instruction(verse_tool)?,
            verse_context(verse?, chapter)
        ),
    };

    Some(StudyPrompt {
        title: tool.title(chapter),
        text,
        mode: tool.mode(),
    })
}
