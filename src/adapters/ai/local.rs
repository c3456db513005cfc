//! Local Responder - the always-available fallback backend.
//!
//! Pure local computation: canned supportive replies keyed off simple topic
//! detection, keyword-tier crisis analysis, and the fixed exercise catalog.
//! `generate_response` never fails and completes in bounded time, so the
//! orchestrator can rely on it as the terminal fallback and as the only
//! backend under forced-offline operation.

use async_trait::async_trait;

use crate::domain::{exercises, risk};
use crate::ports::{
    ChatMessage, CrisisAnalysis, CrisisSupport, MessageRole, PersonalityConfig, Responder,
    ResponderError, RiskLevel, SupportReply,
};

/// Supportive reply templates keyed by rough topic.
struct ReplyTemplate {
    triggers: &'static [&'static str],
    message: &'static str,
    actions: [&'static str; 3],
}

const TEMPLATES: &[ReplyTemplate] = &[
    ReplyTemplate {
        triggers: &["exam", "stress", "pressure", "deadline", "assignment", "marks"],
        message: "Academic pressure can feel overwhelming, and it's okay to find it hard. \
                  Your worth isn't measured by a single exam or grade. Let's take this one \
                  step at a time - what feels most urgent right now?",
        actions: [
            "Break your study plan into small 25-minute blocks",
            "Take a short walk or stretch between sessions",
            "Talk to a classmate or mentor about how you're coping",
        ],
    },
    ReplyTemplate {
        triggers: &["anxious", "anxiety", "panic", "worried", "nervous"],
        message: "Anxiety can make everything feel bigger than it is. You're safe right now, \
                  and this feeling will pass. Let's slow things down together.",
        actions: [
            "Try a 4-4-6 breathing cycle for one minute",
            "Name five things you can see around you",
            "Write down the worry so it's outside your head",
        ],
    },
    ReplyTemplate {
        triggers: &["sleep", "insomnia", "tired", "exhausted", "can't sleep"],
        message: "Rest is hard to find when your mind won't quiet down. Being exhausted makes \
                  everything heavier, so let's look after your sleep first.",
        actions: [
            "Put screens away 30 minutes before bed",
            "Try a short body-scan relaxation lying down",
            "Keep a notepad by your bed for racing thoughts",
        ],
    },
    ReplyTemplate {
        triggers: &["alone", "lonely", "isolated", "no friends", "homesick"],
        message: "Feeling alone, especially away from home, is genuinely hard. Reaching out \
                  takes courage, and you've already done that by talking here.",
        actions: [
            "Message one person you trust, even just to say hi",
            "Join one campus activity or study group this week",
            "Schedule a call with family or an old friend",
        ],
    },
];

/// Fixed reply when no topic matches or an internal fault degrades the path.
const GENERIC_MESSAGE: &str =
    "I'm here to listen and support you. Your feelings are valid, and you don't have to \
     carry them alone. Can you tell me a bit more about what's on your mind today?";

const GENERIC_ACTIONS: [&str; 3] = [
    "Take a few deep, calming breaths",
    "Consider talking to someone you trust",
    "Try some light physical activity or stretching",
];

/// Always-available local responder.
#[derive(Debug, Default, Clone)]
pub struct LocalResponder;

impl LocalResponder {
    /// Creates a new local responder.
    pub fn new() -> Self {
        Self
    }

    /// Picks a canned reply for the latest user message.
    fn reply_for(&self, messages: &[ChatMessage]) -> (String, Vec<String>) {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();

        for template in TEMPLATES {
            if template.triggers.iter().any(|t| last_user.contains(t)) {
                return (
                    template.message.to_string(),
                    template.actions.iter().map(|a| a.to_string()).collect(),
                );
            }
        }

        (
            GENERIC_MESSAGE.to_string(),
            GENERIC_ACTIONS.iter().map(|a| a.to_string()).collect(),
        )
    }

    /// Applies personality injection to a canned message.
    fn personalize(&self, message: String, personality: Option<&PersonalityConfig>) -> String {
        match personality {
            Some(p) if p.custom_prompt.is_some() => match p.name.as_deref() {
                Some(name) if !name.is_empty() => {
                    format!("Hey, it's {name}. {message}")
                }
                _ => message,
            },
            _ => message,
        }
    }
}

#[async_trait]
impl Responder for LocalResponder {
    async fn generate_response(
        &self,
        messages: &[ChatMessage],
        personality: Option<&PersonalityConfig>,
    ) -> Result<SupportReply, ResponderError> {
        let (message, supportive_actions) = self.reply_for(messages);

        let risk_level = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| risk::assess_risk(&m.content))
            .unwrap_or(RiskLevel::Low);

        Ok(SupportReply {
            message: self.personalize(message, personality),
            supportive_actions,
            risk_level,
            escalation_required: risk_level == RiskLevel::High,
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "local"
    }

    fn crisis_support(&self) -> Option<&dyn CrisisSupport> {
        Some(self)
    }
}

#[async_trait]
impl CrisisSupport for LocalResponder {
    async fn analyze_for_crisis(&self, message: &str) -> Result<CrisisAnalysis, ResponderError> {
        Ok(risk::analyze(message))
    }

    async fn guided_exercise(&self, kind: &str) -> Result<Vec<String>, ResponderError> {
        Ok(exercises::steps_for(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_available() {
        assert!(LocalResponder::new().is_available().await);
    }

    #[tokio::test]
    async fn empty_conversation_gets_generic_reply() {
        let responder = LocalResponder::new();
        let reply = responder.generate_response(&[], None).await.unwrap();

        assert_eq!(reply.message, GENERIC_MESSAGE);
        assert_eq!(reply.supportive_actions.len(), 3);
        assert_eq!(reply.risk_level, RiskLevel::Low);
        assert!(!reply.escalation_required);
    }

    #[tokio::test]
    async fn exam_stress_picks_academic_template() {
        let responder = LocalResponder::new();
        let messages = [ChatMessage::user("I'm so stressed about my exam tomorrow")];
        let reply = responder.generate_response(&messages, None).await.unwrap();

        assert!(reply.message.contains("Academic pressure"));
        assert_eq!(reply.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn high_risk_message_escalates() {
        let responder = LocalResponder::new();
        let messages = [ChatMessage::user("I want to end my life")];
        let reply = responder.generate_response(&messages, None).await.unwrap();

        assert_eq!(reply.risk_level, RiskLevel::High);
        assert!(reply.escalation_required);
    }

    #[tokio::test]
    async fn personality_prefixes_name_when_prompt_present() {
        let responder = LocalResponder::new();
        let personality = PersonalityConfig::new("Be gentle and warm", "Asha");
        let reply = responder
            .generate_response(&[ChatMessage::user("hello")], Some(&personality))
            .await
            .unwrap();

        assert!(reply.message.starts_with("Hey, it's Asha."));
    }

    #[tokio::test]
    async fn personality_without_prompt_leaves_message_alone() {
        let responder = LocalResponder::new();
        let personality = PersonalityConfig {
            custom_prompt: None,
            name: Some("Asha".to_string()),
            traits: None,
        };
        let reply = responder
            .generate_response(&[ChatMessage::user("hello")], Some(&personality))
            .await
            .unwrap();

        assert!(!reply.message.contains("Asha"));
    }

    #[tokio::test]
    async fn crisis_capability_is_exposed() {
        let responder = LocalResponder::new();
        let support = responder.crisis_support().expect("local has crisis support");

        let analysis = support.analyze_for_crisis("I feel hopeless").await.unwrap();
        assert_eq!(analysis.severity, RiskLevel::Moderate);

        let steps = support.guided_exercise("breathing").await.unwrap();
        assert!(steps.len() >= 4);
    }

    #[tokio::test]
    async fn latest_user_message_drives_topic_selection() {
        let responder = LocalResponder::new();
        let messages = [
            ChatMessage::user("I can't sleep at night"),
            ChatMessage::assistant("That sounds rough"),
            ChatMessage::user("And I feel so alone here"),
        ];
        let reply = responder.generate_response(&messages, None).await.unwrap();

        assert!(reply.message.contains("Feeling alone"));
    }
}
