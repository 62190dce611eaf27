//! Teaching tones and interest areas.

use database::validation::CUSTOM_TONE;

/// A fixed teaching style selectable on the profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Expert,
    Friendly,
    Direct,
    Excited,
    Nerdy,
    Storyteller,
    Calm,
    Playful,
    Professional,
}

impl Tone {
    /// All tones, in profile-page order.
    pub const ALL: [Tone; 9] = [
        Tone::Expert,
        Tone::Friendly,
        Tone::Direct,
        Tone::Excited,
        Tone::Nerdy,
        Tone::Storyteller,
        Tone::Calm,
        Tone::Playful,
        Tone::Professional,
    ];

    /// Look up a tone by its stored id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tone| tone.id() == id)
    }

    /// The stored id.
    pub fn id(&self) -> &'static str {
        match self {
            Tone::Expert => "expert",
            Tone::Friendly => "friendly",
            Tone::Direct => "direct",
            Tone::Excited => "excited",
            Tone::Nerdy => "nerdy",
            Tone::Storyteller => "storyteller",
            Tone::Calm => "calm",
            Tone::Playful => "playful",
            Tone::Professional => "professional",
        }
    }

    /// The system-prompt sentence for this tone.
    pub fn description(&self) -> &'static str {
        match self {
            Tone::Expert => "You are a university professor, providing precise and technical explanations with academic rigor.",
            Tone::Friendly => "You are a supportive friend, offering warm and encouraging explanations while maintaining accuracy.",
            Tone::Direct => "You provide clear, concise explanations without any unnecessary elaboration.",
            Tone::Excited => "You are enthusiastic and energetic, making learning engaging and fun while maintaining accuracy.",
            Tone::Nerdy => "You are passionate about the subject, incorporating relevant fun facts and geeky references.",
            Tone::Storyteller => "You explain concepts through engaging stories and relatable analogies.",
            Tone::Calm => "You maintain a gentle, relaxed tone while explaining concepts clearly.",
            Tone::Playful => "You incorporate humor and quirky examples while ensuring understanding.",
            Tone::Professional => "You maintain a corporate, formal tone suitable for workplace learning.",
        }
    }
}

/// Interest ids and the analogy areas they stand for.
pub const INTERESTS: [(&str, &str); 12] = [
    ("cars", "automotive and mechanical systems"),
    ("sports", "sports and athletics"),
    ("music", "music and sound"),
    ("tech", "technology and computing"),
    ("cooking", "cooking and culinary arts"),
    ("gaming", "video games and gaming"),
    ("psychology", "psychology and human behavior"),
    ("movies", "movies and television"),
    ("nature", "nature and ecosystems"),
    ("architecture", "architecture and construction"),
    ("travel", "travel and exploration"),
    ("entrepreneurship", "business and entrepreneurship"),
];

/// The analogy area for an interest id; unknown ids pass through unchanged.
pub fn interest_phrase(id: &str) -> &str {
    INTERESTS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, phrase)| *phrase)
        .unwrap_or(id)
}

/// Check that a stored tone id is a known tone or `custom`.
pub fn validate_tone(id: &str) -> Result<(), String> {
    if id == CUSTOM_TONE || Tone::from_id(id).is_some() {
        Ok(())
    } else {
        Err(format!("unknown teaching tone: {}", id))
    }
}
