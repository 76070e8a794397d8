//! Prompt templates for each technique and the code that runs them.

use clap::ValueEnum;
use promptcraft::prelude::{GenerationSettings, Kernel, KernelError, Pipeline, PromptFunction};

pub const NEWS: &str = "Next month, Apple is set to release a new iPhone featuring a larger screen and an improved camera.";

const VAGUE_SUMMARY: &str = "Summarize: {{input}}";

const CLEAR_SUMMARY: &str = "\
Summarize the news item below in exactly one sentence of at most 15 words.
Keep the company and product names. Do not add opinions or speculation.

News: {{input}}";

const PRIMED_EXTRACTION: &str = "\
Read the text and list the product and each new feature it mentions.

Text: {{input}}

Product:";

const DELIMITED_TRANSLATION: &str = r#"### Instructions
Translate the text delimited by triple quotes into French.
Return only the translation.

### Text
"""
{{input}}
"""

### French translation
"#;

const CHAIN_SUMMARIZE: &str = "Summarize the following in one sentence:\n{{input}}";
const CHAIN_TRANSLATE: &str = "Translate this sentence into Spanish:\n{{input}}";
const CHAIN_HEADLINE: &str = "Write a headline of at most eight words for this Spanish sentence, in Spanish:\n{{input}}";

const FEW_SHOT_SENTIMENT: &str = "\
Classify the sentiment of each review as Positive, Negative, or Mixed.

Review: The battery lasts two full days and the screen is gorgeous.
Sentiment: Positive

Review: It overheats while charging and support never answered.
Sentiment: Negative

Review: Great camera, but the price is hard to justify.
Sentiment: Mixed

Review: {{input}}
Sentiment:";

pub const REVIEW: &str = "The larger screen is wonderful, although the phone no longer fits in my pocket.";

const FEW_SHOT_REASONING: &str = "\
Q: A shop sells phone cases for $12 each. Maria buys 3 cases and pays with a $50 bill. How much change does she get?
A: Three cases cost 3 x 12 = 36 dollars. The change is 50 - 36 = 14 dollars. The answer is 14.

Q: A phone battery loses 8% of its charge per hour. Starting at 100%, what is the charge after 5 hours?
A: Five hours use 5 x 8 = 40 percent. The remaining charge is 100 - 40 = 60 percent. The answer is 60%.

Q: {{input}}
A:";

pub const REASONING_QUESTION: &str = "A store orders 4 boxes of 25 iPhones and has already sold 37 of them. How many iPhones are left?";

const DECOMPOSITION: &str = r#"Break the question into the smallest steps needed to answer it.
For any step that needs facts you do not know, write SEARCH("query") on its own line
instead of guessing. Number the steps and finish with "Answer:" once all steps are listed.

Question: {{input}}

Steps:
1."#;

pub const DECOMPOSITION_QUESTION: &str = "Will the new iPhone's camera outperform the best-selling Android phone released this year?";

/// Techniques the demo can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Technique {
    /// Vague versus explicit instructions.
    ClearInstructions,
    /// Ending the prompt where the answer should start.
    OutputPriming,
    /// Delimiters and section headings around the input.
    SyntaxCues,
    /// Feeding one completion into the next prompt.
    Chaining,
    /// Worked input/output examples.
    FewShot,
    /// Examples that show intermediate reasoning.
    FewShotReasoning,
    /// Asking for steps, including literal tool-call text.
    Decomposition,
}

impl Technique {
    pub const ALL: [Self; 7] = [
        Self::ClearInstructions,
        Self::OutputPriming,
        Self::SyntaxCues,
        Self::Chaining,
        Self::FewShot,
        Self::FewShotReasoning,
        Self::Decomposition,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::ClearInstructions => "Clear instructions",
            Self::OutputPriming => "Output priming",
            Self::SyntaxCues => "Syntax cues",
            Self::Chaining => "Prompt chaining",
            Self::FewShot => "Few-shot learning",
            Self::FewShotReasoning => "Few-shot reasoning",
            Self::Decomposition => "Task decomposition",
        }
    }
}

/// One printed block: a label and the text the service returned.
pub struct Section {
    pub label: String,
    pub text: String,
}

impl Section {
    fn new(label: impl Into<String>, text: String) -> Self {
        Self {
            label: label.into(),
            text,
        }
    }
}

fn function(name: &str, template: &str, settings: GenerationSettings) -> Result<PromptFunction, KernelError> {
    PromptFunction::from_text(name, template, settings)
}

/// Runs `technique` and returns the sections to print, in order.
pub async fn run(technique: Technique, kernel: &Kernel) -> anyhow::Result<Vec<Section>> {
    let precise = GenerationSettings::new(200, 0.0, 1.0)?;
    let creative = GenerationSettings::new(200, 0.9, 0.95)?;

    let sections = match technique {
        Technique::ClearInstructions => {
            let vague = function("vague_summary", VAGUE_SUMMARY, creative)?;
            let clear = function("clear_summary", CLEAR_SUMMARY, precise)?;
            vec![
                Section::new("Vague", kernel.invoke(&vague, NEWS).await?),
                Section::new("Clear", kernel.invoke(&clear, NEWS).await?),
            ]
        }
        Technique::OutputPriming => {
            let primed = function("primed_extraction", PRIMED_EXTRACTION, precise)?;
            vec![Section::new("Product:", kernel.invoke(&primed, NEWS).await?)]
        }
        Technique::SyntaxCues => {
            let delimited = function("delimited_translation", DELIMITED_TRANSLATION, precise)?;
            vec![Section::new("Translation", kernel.invoke(&delimited, NEWS).await?)]
        }
        Technique::Chaining => {
            let pipeline = Pipeline::new()
                .stage(function("summarize", CHAIN_SUMMARIZE, precise)?)
                .stage(function("translate", CHAIN_TRANSLATE, precise)?)
                .stage(function("headline", CHAIN_HEADLINE, creative)?);
            let run = pipeline.run(kernel, NEWS).await?;
            run.outputs()
                .iter()
                .map(|stage| Section::new(stage.name(), stage.output().to_owned()))
                .collect()
        }
        Technique::FewShot => {
            let classify = function("sentiment", FEW_SHOT_SENTIMENT, precise.with_max_output_tokens(5)?)?;
            vec![Section::new(
                format!("Review: {REVIEW}"),
                kernel.invoke(&classify, REVIEW).await?,
            )]
        }
        Technique::FewShotReasoning => {
            let reason = function("reasoning", FEW_SHOT_REASONING, precise)?;
            vec![Section::new(
                format!("Q: {REASONING_QUESTION}"),
                kernel.invoke(&reason, REASONING_QUESTION).await?,
            )]
        }
        Technique::Decomposition => {
            let decompose = function("decomposition", DECOMPOSITION, precise.with_max_output_tokens(300)?)?;
            vec![Section::new(
                format!("Question: {DECOMPOSITION_QUESTION}"),
                kernel.invoke(&decompose, DECOMPOSITION_QUESTION).await?,
            )]
        }
    };

    Ok(sections)
}
