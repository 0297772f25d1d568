pub mod loaders;
pub mod record;
pub mod template;

pub use loaders::{load_answer_key, load_template, load_template_or_default, parse_answer_key};
pub use record::{
    AnswerKeyInfo, AnswerRecord, AnswerToken, DecodedField, GradingReport, GradingResult,
    PaperRecord, ANSWER_DELIMITER, SENTINEL,
};
pub use template::{AnswerGridLayout, DigitGridLayout, TemplateLayout};
