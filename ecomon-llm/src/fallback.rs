//! Rule-based collaborators — no model required.
//!
//! [`TemplateGenerator`] answers chat from mood tone and personality and
//! serves quizzes from a built-in question bank. [`KeywordVerifier`] matches
//! the guardian's photo description against per-action keywords. Both are
//! the degraded path when no model is configured, and deterministic under a
//! fixed seed.

use std::future::Future;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use ecomon_core::mood::Mood;
use ecomon_core::reward::EcoAction;
use ecomon_core::Personality;

use crate::error::{LlmError, Result};
use crate::generator::{ContentGenerator, ImageVerifier};
use crate::prompt::action_keywords;
use crate::types::{
    ChatContext, ChatTurn, ImagePayload, QuizCategory, QuizQuestion, QuizRequest, VerificationReport,
};

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

struct BankEntry {
    question: &'static str,
    options: [&'static str; 4],
    correct_index: usize,
    explanation: &'static str,
    category: QuizCategory,
}

const QUESTION_BANK: &[BankEntry] = &[
    BankEntry {
        question: "What percentage of plastic ever made has been recycled?",
        options: ["About 9%", "About 25%", "About 50%", "About 75%"],
        correct_index: 0,
        explanation: "Only about 9% of all plastic ever produced has been recycled. Most ends up in landfills or the environment.",
        category: QuizCategory::Recycling,
    },
    BankEntry {
        question: "How many liters of water does it take to produce one cotton t-shirt?",
        options: ["100 liters", "700 liters", "2,700 liters", "10,000 liters"],
        correct_index: 2,
        explanation: "It takes approximately 2,700 liters of water to make one cotton t-shirt, highlighting the importance of sustainable fashion.",
        category: QuizCategory::Water,
    },
    BankEntry {
        question: "What is the most effective action an individual can take to reduce their carbon footprint?",
        options: ["Recycling", "Using LED bulbs", "Having one fewer child", "Going vegetarian"],
        correct_index: 2,
        explanation: "Studies show having one fewer child is the most impactful choice, followed by living car-free and avoiding air travel.",
        category: QuizCategory::Climate,
    },
    BankEntry {
        question: "How long does it take for a plastic bottle to decompose?",
        options: ["50 years", "100 years", "450 years", "1000 years"],
        correct_index: 2,
        explanation: "Plastic bottles take approximately 450 years to decompose, which is why reducing single-use plastic is so important.",
        category: QuizCategory::Recycling,
    },
    BankEntry {
        question: "What percentage of Earth's water is freshwater available for human use?",
        options: ["Less than 1%", "About 3%", "About 10%", "About 25%"],
        correct_index: 0,
        explanation: "Less than 1% of Earth's water is freshwater available for human use. Most water is saltwater or locked in ice caps.",
        category: QuizCategory::Water,
    },
    BankEntry {
        question: "Roughly how much less energy does an LED bulb use than an incandescent bulb for the same light?",
        options: ["About 10% less", "About 30% less", "About 50% less", "About 75% less"],
        correct_index: 3,
        explanation: "LED bulbs use around 75% less energy and last many times longer than incandescent bulbs.",
        category: QuizCategory::Energy,
    },
    BankEntry {
        question: "Which group of animals pollinates the largest share of the world's food crops?",
        options: ["Birds", "Bees and other insects", "Bats", "Lizards"],
        correct_index: 1,
        explanation: "Bees and other insects pollinate most animal-pollinated crops, which is why bee houses and native plants matter.",
        category: QuizCategory::Wildlife,
    },
];

impl BankEntry {
    fn to_question(&self) -> QuizQuestion {
        QuizQuestion {
            question: self.question.to_string(),
            options: self.options.iter().map(|o| (*o).to_string()).collect(),
            correct_index: self.correct_index,
            explanation: self.explanation.to_string(),
            category: self.category,
        }
    }
}

/// Number of questions in the built-in bank.
#[must_use]
pub fn bank_size() -> usize {
    QUESTION_BANK.len()
}

// ---------------------------------------------------------------------------
// TemplateGenerator
// ---------------------------------------------------------------------------

fn greeting(personality: Personality) -> &'static [&'static str] {
    match personality {
        Personality::Sage => &[
            "In patience, true growth is found.",
            "Like the forest, we must learn to regenerate.",
            "Every small seed carries the memory of a great tree.",
        ],
        Personality::Cheerleader => &[
            "GREEN POWER! You're here!",
            "We're absolutely UNSTOPPABLE eco-warriors!",
            "Another day to save the planet, let's GO!",
        ],
        Personality::Scientist => &[
            "Fascinating! Let's look at the data together.",
            "Based on environmental data, every action compounds.",
            "Hypothesis: today is a good day for an eco-action.",
        ],
        Personality::Empath => &[
            "Your kindness to the Earth warms my heart.",
            "I sense your love for our planet...",
            "I'm so glad you came to talk with me.",
        ],
    }
}

fn mood_line(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "I'm feeling really happy today!",
        Mood::Sad => "I've been feeling a little down lately.",
        Mood::Excited => "I can barely contain my excitement!",
        Mood::Curious => "I've been wondering about so many things.",
        Mood::Worried => "I'm a bit worried about our planet.",
        Mood::Proud => "I'm so proud of what we've done together.",
        Mood::Content => "Everything feels calm and balanced.",
        Mood::Sleepy => "I'm feeling a little drowsy...",
        Mood::Energetic => "I'm full of energy!",
        Mood::Thoughtful => "I've been thinking deeply about nature.",
    }
}

/// Model-free content generator.
pub struct TemplateGenerator {
    rng: Mutex<StdRng>,
}

impl TemplateGenerator {
    /// A generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    /// A generator with reproducible choices.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Compose a reply without a model.
    #[must_use]
    pub fn compose_reply(&self, context: &ChatContext, message: &str) -> String {
        let opener = greeting(context.personality)
            .choose(&mut *self.rng.lock())
            .copied()
            .unwrap_or_default();

        let mut reply = format!("{opener} {}", mood_line(context.mood));
        if context.corrupted {
            reply.push_str(" I feel myself fading... could we help nature together again?");
        } else if let Some(action) = context.recent_actions.last() {
            reply.push_str(&format!(" I still remember: {action}."));
        }
        if message.trim_end().ends_with('?') {
            reply.push_str(&format!(" That's a good question, {}!", context.guardian_name));
        }
        reply
    }

    /// Pick questions from the bank.
    ///
    /// # Errors
    ///
    /// [`LlmError::InvalidRequest`] for a zero count.
    pub fn pick_questions(&self, request: &QuizRequest) -> Result<Vec<QuizQuestion>> {
        if request.count == 0 {
            return Err(LlmError::InvalidRequest("quiz count must be at least 1".to_string()));
        }
        let mut pool: Vec<&BankEntry> = match request.category {
            Some(c) => QUESTION_BANK.iter().filter(|q| q.category == c).collect(),
            None => Vec::new(),
        };
        if pool.is_empty() {
            pool = QUESTION_BANK.iter().collect();
        }
        pool.shuffle(&mut *self.rng.lock());
        pool.truncate(request.count);
        debug!(count = pool.len(), requested = request.count, "Serving quiz from question bank");
        Ok(pool.into_iter().map(BankEntry::to_question).collect())
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentGenerator for TemplateGenerator {
    fn chat_reply(
        &self,
        context: &ChatContext,
        _history: &[ChatTurn],
        message: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        let reply = self.compose_reply(context, message);
        async move { Ok(reply) }
    }

    fn quiz_questions(
        &self,
        request: &QuizRequest,
    ) -> impl Future<Output = Result<Vec<QuizQuestion>>> + Send {
        let questions = self.pick_questions(request);
        async move { questions }
    }

    fn name(&self) -> &'static str {
        "template"
    }
}

// ---------------------------------------------------------------------------
// KeywordVerifier
// ---------------------------------------------------------------------------

/// Model-free verifier that reads the guardian's description.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordVerifier;

impl KeywordVerifier {
    /// Classify a description. The action with the most keyword hits wins;
    /// ties go to catalog order.
    #[must_use]
    pub fn classify(description: &str) -> VerificationReport {
        let text = description.to_lowercase();
        let best = EcoAction::ALL
            .iter()
            .map(|a| {
                let hits: Vec<&str> = action_keywords(*a)
                    .iter()
                    .copied()
                    .filter(|k| text.contains(&k.to_lowercase()))
                    .collect();
                (*a, hits)
            })
            .filter(|(_, hits)| !hits.is_empty())
            .fold(None::<(EcoAction, Vec<&str>)>, |best, (a, hits)| {
                if best.as_ref().is_some_and(|(_, b)| b.len() >= hits.len()) {
                    best
                } else {
                    Some((a, hits))
                }
            });

        match best {
            Some((action, hits)) => {
                let n = u32::try_from(hits.len()).unwrap_or(u32::MAX);
                let confidence = (0.5 + 0.1 * f64::from(n)).min(0.9);
                VerificationReport {
                    is_verified: true,
                    confidence,
                    action_type: Some(action.key().to_string()),
                    description: format!("Description mentions {}", hits.join(", ")),
                    suggestions: Vec::new(),
                    detected_objects: hits.iter().map(|h| (*h).to_string()).collect(),
                }
            }
            None => VerificationReport::rejected(
                "Describe the eco-action in the photo so it can be recognised",
            ),
        }
    }
}

impl ImageVerifier for KeywordVerifier {
    fn verify(&self, image: &ImagePayload) -> impl Future<Output = Result<VerificationReport>> + Send {
        let report = Self::classify(image.description.as_deref().unwrap_or_default());
        async move { Ok(report) }
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecomon_core::emotion::EmotionalState;
    use ecomon_core::Species;

    fn context(mood: Mood) -> ChatContext {
        ChatContext {
            guardian_name: "Ari".into(),
            companion_name: "Sprig".into(),
            personality: Personality::Sage,
            species: Species::Leaf,
            mood,
            emotions: EmotionalState::NEUTRAL,
            stage: 1,
            corrupted: false,
            memories: Vec::new(),
            recent_actions: vec!["Verified recycle: Properly sort and recycle materials".into()],
        }
    }

    #[test]
    fn bank_questions_are_well_formed() {
        for q in QUESTION_BANK {
            let q = q.to_question();
            assert_eq!(q.options.len(), 4);
            assert!(q.correct_index < 4);
        }
    }

    #[test]
    fn seeded_generators_agree() {
        let a = TemplateGenerator::with_seed(7);
        let b = TemplateGenerator::with_seed(7);
        let req = QuizRequest { count: 3, ..QuizRequest::default() };
        assert_eq!(a.pick_questions(&req).expect("ok"), b.pick_questions(&req).expect("ok"));
        assert_eq!(
            a.compose_reply(&context(Mood::Happy), "hi"),
            b.compose_reply(&context(Mood::Happy), "hi")
        );
    }

    #[test]
    fn category_filter_and_truncation() {
        let g = TemplateGenerator::with_seed(1);
        let water = g
            .pick_questions(&QuizRequest { category: Some(QuizCategory::Water), count: 10, ..QuizRequest::default() })
            .expect("ok");
        assert_eq!(water.len(), 2);
        assert!(water.iter().all(|q| q.category == QuizCategory::Water));

        let all = g.pick_questions(&QuizRequest { count: 100, ..QuizRequest::default() }).expect("ok");
        assert_eq!(all.len(), bank_size());

        assert!(g.pick_questions(&QuizRequest { count: 0, ..QuizRequest::default() }).is_err());
    }

    #[test]
    fn reply_reflects_mood_and_actions() {
        let g = TemplateGenerator::with_seed(3);
        let reply = g.compose_reply(&context(Mood::Worried), "How are you?");
        assert!(reply.contains("worried"));
        assert!(reply.contains("Verified recycle"));
        assert!(reply.contains("Ari"));
    }

    #[test]
    fn keyword_verifier_picks_best_match() {
        let r = KeywordVerifier::classify("Planting a sapling in the garden soil");
        assert!(r.is_verified);
        assert_eq!(r.action(), Some(EcoAction::PlantTree));
        assert!((r.confidence - 0.9).abs() < 1e-9);

        let r = KeywordVerifier::classify("a selfie at the mall");
        assert!(!r.is_verified);
        assert_eq!(r.action(), None);
    }

    #[tokio::test]
    async fn async_contracts() {
        let g = TemplateGenerator::with_seed(9);
        let reply = g.chat_reply(&context(Mood::Content), &[], "hello").await.expect("reply");
        assert!(!reply.is_empty());

        let image = ImagePayload {
            mime_type: "image/jpeg".into(),
            data_base64: String::new(),
            description: Some("riding my bike on the bike lane".into()),
        };
        let report = KeywordVerifier.verify(&image).await.expect("report");
        assert_eq!(report.action(), Some(EcoAction::BikeCommute));
    }
}
