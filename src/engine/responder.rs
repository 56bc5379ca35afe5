//! Canned base-response generation
//!
//! Stands in for a language model: picks a reply by intent keyword match,
//! specialized per conversation context. The renderer styles this text
//! afterwards.

use crate::context::Context;

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "good morning", "good afternoon"];
const HELP_WORDS: &[&str] = &["help", "assist", "support", "aid"];
const CAPABILITY_PHRASES: &[&str] = &[
    "what can you do",
    "your capabilities",
    "what do you do",
    "your features",
];
const TONE_PHRASES: &[&str] = &["tone", "style", "adaptation", "preferences"];
const THANKS_WORDS: &[&str] = &["thank", "thanks", "appreciate"];
const WELLBEING_PHRASES: &[&str] = &["how are you", "how do you do", "are you ok"];

/// Generate a base response for a message in a given context
pub fn generate(message: &str, context: Context) -> String {
    let lowered = message.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if contains_any(GREETING_WORDS) {
        match context {
            Context::Work => {
                "Hello! I'm ready to assist you with your work tasks. What would you like to work on today?"
            }
            Context::Personal => {
                "Hi there! How are you doing today? I'm here to chat and help with whatever you need."
            }
            Context::Academic => {
                "Hello! I'm here to help with your studies. What subject or topic would you like to explore?"
            }
            Context::Unknown => "Hello! I'm here to help you. What can I assist you with today?",
        }
        .to_string()
    } else if contains_any(HELP_WORDS) {
        match context {
            Context::Work => {
                "I'm here to help with your work tasks. Whether it's project management, analysis, or problem-solving, I'm ready to assist. What specific area do you need help with?"
            }
            Context::Personal => {
                "I'd be happy to help with whatever you need! Whether it's advice, information, or just someone to talk to, I'm here for you."
            }
            Context::Academic => {
                "I can help you with your academic work. From research to writing to problem-solving, I'm here to support your learning. What subject or topic do you need help with?"
            }
            Context::Unknown => {
                "I'm here to help! I can assist with information, problem-solving, analysis, or just general conversation. What would you like to work on?"
            }
        }
        .to_string()
    } else if contains_any(CAPABILITY_PHRASES) {
        "I'm an AI assistant with tone adaptation capabilities. I can help with information, analysis, problem-solving, writing, and more. I adapt my communication style based on your preferences and the context of our conversation.".to_string()
    } else if contains_any(TONE_PHRASES) {
        "I adapt my communication style based on your preferences for formality, enthusiasm, verbosity, empathy, and humor. I analyze the context of our conversation and adjust my tone accordingly to provide the most helpful and comfortable experience for you.".to_string()
    } else if contains_any(THANKS_WORDS) {
        "You're welcome! I'm glad I could help. Is there anything else you'd like to work on or discuss?".to_string()
    } else if contains_any(WELLBEING_PHRASES) {
        "I'm functioning well and ready to help! I'm designed to assist with various tasks and adapt my communication style to your preferences. How about you - how are you doing?".to_string()
    } else if message.contains('?') {
        match context {
            Context::Work => {
                "That's a great question! Let me help you find the information or solution you need. Could you provide a bit more context so I can give you the most relevant and helpful response?"
            }
            Context::Personal => {
                "I'd be happy to help answer your question! What specific information or advice are you looking for?"
            }
            Context::Academic => {
                "That's an interesting question! I can help you research this topic or break it down for better understanding. What aspect would you like to explore further?"
            }
            Context::Unknown => {
                "That's a good question! I'm here to help you find the answer. Could you give me a bit more context so I can provide the most helpful response?"
            }
        }
        .to_string()
    } else {
        match context {
            Context::Work => {
                "I understand your message. This sounds like a work-related topic. Let me help you with that - what specific aspect would you like to focus on or develop further?"
            }
            Context::Personal => {
                "Thanks for sharing that with me. I'm here to listen and help however I can. What would you like to explore or discuss further?"
            }
            Context::Academic => {
                "I see you're working on something academic. This sounds interesting! How can I help you develop this further or explore related topics?"
            }
            Context::Unknown => {
                "I understand what you're saying. This sounds like something I can help you with. What specific aspect would you like to work on or explore further?"
            }
        }
        .to_string()
    }
}
