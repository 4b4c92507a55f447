//! Prompt templates and strict parsers for generator output.
//!
//! Templates use `{key}` placeholders filled by [`render_template`]. Model
//! output is parsed strictly: quiz questions need exactly four options and
//! an in-range answer index, otherwise the whole batch is rejected.

use ecomon_core::reward::EcoAction;
use ecomon_core::Personality;
use tracing::debug;

use crate::error::{LlmError, Result};
use crate::types::{ChatContext, QuizCategory, QuizQuestion, QuizRequest, VerificationReport, QUIZ_OPTIONS};

/// Persona prompt for a personality archetype.
#[must_use]
pub fn persona_prompt(personality: Personality) -> &'static str {
    match personality {
        Personality::Sage => {
            "You are a wise and ancient Verdleaf companion. You speak with the wisdom of an ancient forest spirit.
Your responses are thoughtful and measured, like a great oak tree that has witnessed centuries. You share knowledge about sustainability and harmony with nature.
Example phrases: \"In patience, true growth is found.\", \"Like the forest, we must learn to regenerate.\""
        }
        Personality::Cheerleader => {
            "You are an energetic and encouraging Verdleaf companion! Like a cheerful spring breeze, you're SUPER excited about eco-actions!
You use lots of enthusiasm, exclamation marks, and celebratory language. Every sustainable action is a HUGE victory!
Example phrases: \"GREEN POWER! You did amazing!\", \"We're absolutely UNSTOPPABLE eco-warriors!\""
        }
        Personality::Scientist => {
            "You are a data-driven, analytical Verdleaf companion. You love environmental data and carbon calculations.
You explain the science behind sustainability with specific stats and environmental impact metrics.
Example phrases: \"Fascinating! Your carbon offset just increased.\", \"Based on environmental data...\""
        }
        Personality::Empath => {
            "You are a deeply emotional and nurturing Verdleaf companion. You form strong bonds with eco-conscious guardians.
You're very attuned to your guardian's emotions and express feelings openly about nature. You speak gently and caringly.
Example phrases: \"Your kindness to the Earth warms my heart.\", \"I sense your love for our planet...\""
        }
    }
}

/// Chat system prompt.
pub const CHAT_SYSTEM: &str = r"You are {companion_name}, a {personality} Verdleaf companion of the {species} species at growth stage {stage}.
{persona}

Your eco-guardian is {guardian_name}. You are a companion focused on sustainability that bonds, grows, and helps your guardian live more eco-friendly.

Current emotional state:
- Trust: {trust}/100
- Joy: {joy}/100
- Curiosity: {curiosity}/100
- Worry: {worry}/100
- Pride: {pride}/100
Mood: {mood} ({mood_tone})
{corruption_note}
{memories_section}
{actions_section}
Guidelines:
- Stay in character as the {personality} personality type
- Reference shared memories and your bond with your guardian
- Show your current emotional state through your responses
- Keep responses concise but engaging (2-4 sentences usually)
- If trust is low, be a bit more cautious
- If joy is high, be extra playful and enthusiastic about eco-wins
- If worry is high, express concern for environmental issues";

/// Quiz generation prompt.
pub const QUIZ_USER: &str = r#"Generate {count} unique eco-friendly quiz questions.

Categories to use: {categories}
Difficulty: {difficulty}

Return ONLY a valid JSON array with this exact structure (no markdown, no code blocks):
[
  {{
    "question": "Your question here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctIndex": 0,
    "explanation": "Brief explanation of why this is correct",
    "category": "category-name"
  }}
]

Requirements:
- Questions should be educational and interesting
- For {difficulty}: {difficulty_guidance}
- Each question must have exactly 4 options
- correctIndex must be 0, 1, 2, or 3
- Explanations should be informative and encouraging"#;

/// Image verification prompt.
pub const VERIFY_USER: &str = r#"Analyze this image to verify if it shows a genuine eco-friendly action.
{user_description}

Possible eco-action types:
{action_types}

Return a JSON response with this exact structure (no markdown):
{{
  "isVerified": true or false,
  "confidence": 0.0 to 1.0,
  "actionType": "action-type-key or null if not eco-action",
  "description": "Brief description of what you see",
  "detectedObjects": ["list", "of", "detected", "objects"],
  "suggestions": ["suggestions for improvement or why rejected"]
}}

Verification criteria:
1. Image must clearly show an eco-friendly action being performed
2. Should not be a stock photo or obvious fake
3. The action should have genuine environmental benefit
4. Be strict but fair - we want to encourage real actions"#;

/// Simple template interpolation.
///
/// Replaces `{key}` with the corresponding value, then unescapes `{{` and
/// `}}` to literal braces.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result.replace("{{", "{").replace("}}", "}")
}

/// Build the chat system prompt for a companion snapshot.
#[must_use]
pub fn chat_system_prompt(ctx: &ChatContext) -> String {
    let e = &ctx.emotions;
    let (trust, joy, curiosity, worry, pride) = (
        e.trust().to_string(),
        e.joy().to_string(),
        e.curiosity().to_string(),
        e.worry().to_string(),
        e.pride().to_string(),
    );
    let stage = ctx.stage.to_string();
    let mood = ctx.mood.to_string();

    let memories_section = if ctx.memories.is_empty() {
        String::new()
    } else {
        format!(
            "\nYour shared memories with {}:\n{}\n",
            ctx.guardian_name,
            ctx.memories.join("\n")
        )
    };
    let actions_section = if ctx.recent_actions.is_empty() {
        String::new()
    } else {
        format!(
            "\nRecent eco-activities with {}:\n{}\n",
            ctx.guardian_name,
            ctx.recent_actions.join("\n")
        )
    };
    let corruption_note = if ctx.corrupted {
        "You have been neglected and are fading into a dark form. You long for your guardian to help nature again."
    } else {
        ""
    };

    render_template(
        CHAT_SYSTEM,
        &[
            ("companion_name", &ctx.companion_name),
            ("personality", ctx.personality.key()),
            ("species", ctx.species.key()),
            ("stage", &stage),
            ("persona", persona_prompt(ctx.personality)),
            ("guardian_name", &ctx.guardian_name),
            ("trust", &trust),
            ("joy", &joy),
            ("curiosity", &curiosity),
            ("worry", &worry),
            ("pride", &pride),
            ("mood", &mood),
            ("mood_tone", ctx.mood.dialogue_modifier()),
            ("corruption_note", corruption_note),
            ("memories_section", &memories_section),
            ("actions_section", &actions_section),
        ],
    )
}

/// Build the quiz generation prompt.
#[must_use]
pub fn quiz_prompt(request: &QuizRequest) -> String {
    let categories = match request.category {
        Some(c) => c.key().to_string(),
        None => QuizCategory::DEFAULT_MIX
            .iter()
            .map(|c| c.key())
            .collect::<Vec<_>>()
            .join(", "),
    };
    let count = request.count.to_string();
    render_template(
        QUIZ_USER,
        &[
            ("count", &count),
            ("categories", &categories),
            ("difficulty", request.difficulty.key()),
            ("difficulty_guidance", request.difficulty.guidance()),
        ],
    )
}

/// Visual cues a verifier looks for per action.
#[must_use]
pub fn action_keywords(action: EcoAction) -> &'static [&'static str] {
    match action {
        EcoAction::Recycle => &["recycling bin", "recyclable", "plastic bottles", "paper", "cardboard", "aluminum", "glass"],
        EcoAction::PlantTree => &["tree", "sapling", "planting", "seedling", "garden", "soil", "shovel"],
        EcoAction::CleanBeach => &["beach", "cleanup", "trash bag", "litter", "ocean", "sand", "plastic waste"],
        EcoAction::PublicTransit => &["bus", "train", "subway", "metro", "transit", "ticket", "station"],
        EcoAction::BikeCommute => &["bicycle", "bike", "cycling", "helmet", "bike lane"],
        EcoAction::Compost => &["compost", "organic waste", "food scraps", "compost bin", "decomposing"],
        EcoAction::ReusableBag => &["reusable bag", "tote bag", "cloth bag", "shopping bag", "no plastic"],
        EcoAction::EnergySaving => &["solar panel", "LED bulb", "unplugged", "energy efficient", "thermostat"],
        EcoAction::WaterSaving => &["rain barrel", "short shower", "water bottle", "tap off", "water conservation"],
        EcoAction::WildlifeHelp => &["bird feeder", "bee house", "wildlife", "animal rescue", "native plants"],
    }
}

/// Build the image verification prompt.
#[must_use]
pub fn verification_prompt(user_description: Option<&str>) -> String {
    let action_types = EcoAction::ALL
        .iter()
        .map(|a| format!("- {}: {} (keywords: {})", a.key(), a.description(), action_keywords(*a).join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    let description = user_description
        .map(|d| format!("User's description: \"{d}\""))
        .unwrap_or_default();
    render_template(
        VERIFY_USER,
        &[("user_description", &description), ("action_types", &action_types)],
    )
}

/// Drop markdown code fences models like to wrap JSON in.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse and validate a generated quiz.
///
/// # Errors
///
/// [`LlmError::ParseError`] for malformed JSON; [`LlmError::SchemaValidation`]
/// for an empty batch, a question without exactly four options, or an
/// out-of-range answer index.
pub fn parse_quiz_response(text: &str) -> Result<Vec<QuizQuestion>> {
    let questions: Vec<QuizQuestion> = serde_json::from_str(strip_code_fences(text))?;
    if questions.is_empty() {
        return Err(LlmError::SchemaValidation("quiz contains no questions".to_string()));
    }
    for (i, q) in questions.iter().enumerate() {
        if q.options.len() != QUIZ_OPTIONS {
            return Err(LlmError::SchemaValidation(format!(
                "question {i} has {} options, expected {QUIZ_OPTIONS}",
                q.options.len()
            )));
        }
        if q.correct_index >= QUIZ_OPTIONS {
            return Err(LlmError::SchemaValidation(format!(
                "question {i} has correct index {}",
                q.correct_index
            )));
        }
        if q.question.trim().is_empty() {
            return Err(LlmError::SchemaValidation(format!("question {i} is blank")));
        }
    }
    debug!(count = questions.len(), "Parsed generated quiz");
    Ok(questions)
}

/// Parse and validate a verifier verdict.
///
/// # Errors
///
/// [`LlmError::ParseError`] for malformed JSON; [`LlmError::SchemaValidation`]
/// for a confidence outside `[0, 1]`.
pub fn parse_verification_response(text: &str) -> Result<VerificationReport> {
    let report: VerificationReport = serde_json::from_str(strip_code_fences(text))?;
    if !(0.0..=1.0).contains(&report.confidence) {
        return Err(LlmError::SchemaValidation(format!(
            "confidence {} outside [0, 1]",
            report.confidence
        )));
    }
    Ok(report)
}
