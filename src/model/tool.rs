//! The closed tool catalog: [`ToolType`] and its parameter schema.
//!
//! Tools are a closed tagged enum rather than a dynamic registry of trait
//! objects — the planner must be able to reject a hallucinated action name
//! outright (`ToolCatalog::lookup`) instead of merely failing to find it in a
//! map. Each variant carries its static metadata (description, risk class,
//! confirmation flag, parameter schema) as associated data computed by the
//! `impl` below rather than stored per-instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base risk classification of a tool, independent of its parameters or the
/// calling context. Feeds into `RiskScore.contributions.tool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskClass {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskClass {
    /// Numeric contribution in `[0, 1]` used by the risk formula.
    pub fn weight(self) -> f64 {
        match self {
            RiskClass::Low => 0.1,
            RiskClass::Medium => 0.4,
            RiskClass::High => 0.7,
            RiskClass::Critical => 1.0,
        }
    }
}

/// JSON-ish parameter type used for coercion in `extract_parameters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Bool,
    Object,
    Array,
}

/// Schema for a single named parameter of a [`ToolType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchema {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
}

const fn p(name: &'static str, ty: ParamType, required: bool) -> ParamSchema {
    ParamSchema {
        name,
        ty,
        required,
    }
}

/// The closed set of capabilities the planner may invoke.
///
/// Hallucinated action names never make it into this enum — `ToolCatalog`
/// resolves LLM action names against these variants by exact,
/// case-insensitive match and yields `None` (a caller-visible `UnknownTool`)
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolType {
    OpenApplication,
    CloseApplication,
    WebSearch,
    WebFetch,
    GetWeather,
    SendEmail,
    ReadEmail,
    SetReminder,
    CancelReminder,
    SetAlarm,
    SetTimer,
    AddCalendarEvent,
    GetCalendarEvents,
    SendMessage,
    MakePhoneCall,
    PlayMusic,
    PauseMusic,
    AdjustVolume,
    GetNews,
    TranslateText,
    UnitConversion,
    Calculate,
    SetBrightness,
    SystemControl,
    SystemShutdown,
    FormatDrive,
    DeleteFile,
    ReadFile,
    WriteFile,
    DatabaseQuery,
    GetLocation,
    SetTimezone,
}

impl ToolType {
    /// All variants, in the order presented in the tool manifest.
    pub const ALL: &'static [ToolType] = &[
        ToolType::OpenApplication,
        ToolType::CloseApplication,
        ToolType::WebSearch,
        ToolType::WebFetch,
        ToolType::GetWeather,
        ToolType::SendEmail,
        ToolType::ReadEmail,
        ToolType::SetReminder,
        ToolType::CancelReminder,
        ToolType::SetAlarm,
        ToolType::SetTimer,
        ToolType::AddCalendarEvent,
        ToolType::GetCalendarEvents,
        ToolType::SendMessage,
        ToolType::MakePhoneCall,
        ToolType::PlayMusic,
        ToolType::PauseMusic,
        ToolType::AdjustVolume,
        ToolType::GetNews,
        ToolType::TranslateText,
        ToolType::UnitConversion,
        ToolType::Calculate,
        ToolType::SetBrightness,
        ToolType::SystemControl,
        ToolType::SystemShutdown,
        ToolType::FormatDrive,
        ToolType::DeleteFile,
        ToolType::ReadFile,
        ToolType::WriteFile,
        ToolType::DatabaseQuery,
        ToolType::GetLocation,
        ToolType::SetTimezone,
    ];

    /// Canonical `SCREAMING_SNAKE_CASE` name, as emitted in observations and
    /// matched (case-insensitively) against the LLM's `Action:` line.
    pub fn canonical_name(self) -> &'static str {
        match self {
            ToolType::OpenApplication => "OPEN_APPLICATION",
            ToolType::CloseApplication => "CLOSE_APPLICATION",
            ToolType::WebSearch => "WEB_SEARCH",
            ToolType::WebFetch => "WEB_FETCH",
            ToolType::GetWeather => "GET_WEATHER",
            ToolType::SendEmail => "SEND_EMAIL",
            ToolType::ReadEmail => "READ_EMAIL",
            ToolType::SetReminder => "SET_REMINDER",
            ToolType::CancelReminder => "CANCEL_REMINDER",
            ToolType::SetAlarm => "SET_ALARM",
            ToolType::SetTimer => "SET_TIMER",
            ToolType::AddCalendarEvent => "ADD_CALENDAR_EVENT",
            ToolType::GetCalendarEvents => "GET_CALENDAR_EVENTS",
            ToolType::SendMessage => "SEND_MESSAGE",
            ToolType::MakePhoneCall => "MAKE_PHONE_CALL",
            ToolType::PlayMusic => "PLAY_MUSIC",
            ToolType::PauseMusic => "PAUSE_MUSIC",
            ToolType::AdjustVolume => "ADJUST_VOLUME",
            ToolType::GetNews => "GET_NEWS",
            ToolType::TranslateText => "TRANSLATE_TEXT",
            ToolType::UnitConversion => "UNIT_CONVERSION",
            ToolType::Calculate => "CALCULATE",
            ToolType::SetBrightness => "SET_BRIGHTNESS",
            ToolType::SystemControl => "SYSTEM_CONTROL",
            ToolType::SystemShutdown => "SYSTEM_SHUTDOWN",
            ToolType::FormatDrive => "FORMAT_DRIVE",
            ToolType::DeleteFile => "DELETE_FILE",
            ToolType::ReadFile => "READ_FILE",
            ToolType::WriteFile => "WRITE_FILE",
            ToolType::DatabaseQuery => "DATABASE_QUERY",
            ToolType::GetLocation => "GET_LOCATION",
            ToolType::SetTimezone => "SET_TIMEZONE",
        }
    }

    /// Parse a (case-insensitive) action name from the LLM into a `ToolType`.
    /// No fuzzy resolution: a typo or invented name yields `None`.
    pub fn parse(action_name: &str) -> Option<ToolType> {
        let needle = action_name.trim();
        ToolType::ALL
            .iter()
            .copied()
            .find(|t| t.canonical_name().eq_ignore_ascii_case(needle))
    }

    /// One-line human description for the tool manifest.
    pub fn description(self) -> &'static str {
        match self {
            ToolType::OpenApplication => "Launch an application by name.",
            ToolType::CloseApplication => "Close a running application by name.",
            ToolType::WebSearch => "Search the web for a query and return top results.",
            ToolType::WebFetch => "Fetch the contents of a URL.",
            ToolType::GetWeather => "Get the current weather for a location.",
            ToolType::SendEmail => "Compose and send an email.",
            ToolType::ReadEmail => "Read recent emails from the inbox.",
            ToolType::SetReminder => "Set a reminder for a future time.",
            ToolType::CancelReminder => "Cancel a previously set reminder.",
            ToolType::SetAlarm => "Set an alarm for a specific time.",
            ToolType::SetTimer => "Start a countdown timer.",
            ToolType::AddCalendarEvent => "Add an event to the user's calendar.",
            ToolType::GetCalendarEvents => "List upcoming calendar events.",
            ToolType::SendMessage => "Send a text message to a contact.",
            ToolType::MakePhoneCall => "Place a phone call to a contact.",
            ToolType::PlayMusic => "Play a song, album, or playlist.",
            ToolType::PauseMusic => "Pause the currently playing music.",
            ToolType::AdjustVolume => "Adjust the system or media volume.",
            ToolType::GetNews => "Fetch recent news headlines for a topic.",
            ToolType::TranslateText => "Translate text between languages.",
            ToolType::UnitConversion => "Convert a quantity between units.",
            ToolType::Calculate => "Evaluate an arithmetic expression.",
            ToolType::SetBrightness => "Adjust screen brightness.",
            ToolType::SystemControl => "Perform a system-level action (sleep, lock, restart).",
            ToolType::SystemShutdown => "Power off the device.",
            ToolType::FormatDrive => "Format a storage drive, destroying its contents.",
            ToolType::DeleteFile => "Delete a file from the filesystem.",
            ToolType::ReadFile => "Read the contents of a file.",
            ToolType::WriteFile => "Write content to a file.",
            ToolType::DatabaseQuery => "Run a query against a backing database.",
            ToolType::GetLocation => "Get the device's current location.",
            ToolType::SetTimezone => "Change the device's configured timezone.",
        }
    }

    /// Base risk class, before parameters or context are considered.
    pub fn risk_class(self) -> RiskClass {
        match self {
            ToolType::GetWeather
            | ToolType::GetNews
            | ToolType::TranslateText
            | ToolType::UnitConversion
            | ToolType::Calculate
            | ToolType::GetLocation
            | ToolType::ReadEmail
            | ToolType::GetCalendarEvents
            | ToolType::PlayMusic
            | ToolType::PauseMusic => RiskClass::Low,

            ToolType::OpenApplication
            | ToolType::CloseApplication
            | ToolType::WebSearch
            | ToolType::WebFetch
            | ToolType::SetReminder
            | ToolType::CancelReminder
            | ToolType::SetAlarm
            | ToolType::SetTimer
            | ToolType::AddCalendarEvent
            | ToolType::AdjustVolume
            | ToolType::SetBrightness
            | ToolType::SetTimezone
            | ToolType::ReadFile => RiskClass::Medium,

            ToolType::SendEmail
            | ToolType::SendMessage
            | ToolType::MakePhoneCall
            | ToolType::WriteFile
            | ToolType::SystemControl
            | ToolType::DatabaseQuery => RiskClass::High,

            ToolType::SystemShutdown | ToolType::FormatDrive | ToolType::DeleteFile => {
                RiskClass::Critical
            }
        }
    }

    /// Whether this tool is blocked outright regardless of parameters — the
    /// irreversible, destructive operations.
    pub fn is_blacklisted(self) -> bool {
        matches!(
            self,
            ToolType::SystemShutdown | ToolType::FormatDrive | ToolType::DeleteFile
        )
    }

    /// Static confirmation flag: some tools always require confirmation
    /// irrespective of the computed risk level.
    pub fn requires_confirmation(self) -> bool {
        matches!(
            self,
            ToolType::SendEmail
                | ToolType::SendMessage
                | ToolType::MakePhoneCall
                | ToolType::SystemControl
                | ToolType::DatabaseQuery
        )
    }

    /// Parameter schema used by `ToolCatalog::extract_parameters` for
    /// presence/type validation and coercion.
    pub fn param_schema(self) -> &'static [ParamSchema] {
        use ParamType::*;
        match self {
            ToolType::OpenApplication => &[p("app_name", String, true)],
            ToolType::CloseApplication => &[p("app_name", String, true)],
            ToolType::WebSearch => &[p("query", String, true)],
            ToolType::WebFetch => &[p("url", String, true)],
            ToolType::GetWeather => &[p("location", String, true)],
            ToolType::SendEmail => &[
                p("to", String, true),
                p("subject", String, true),
                p("body", String, true),
            ],
            ToolType::ReadEmail => &[p("limit", Number, false)],
            ToolType::SetReminder => &[
                p("text", String, true),
                p("time", String, true),
            ],
            ToolType::CancelReminder => &[p("reminder_id", String, true)],
            ToolType::SetAlarm => &[p("time", String, true)],
            ToolType::SetTimer => &[p("duration_seconds", Number, true)],
            ToolType::AddCalendarEvent => &[
                p("title", String, true),
                p("start_time", String, true),
                p("end_time", String, false),
            ],
            ToolType::GetCalendarEvents => &[p("range", String, false)],
            ToolType::SendMessage => &[
                p("contact", String, true),
                p("text", String, true),
            ],
            ToolType::MakePhoneCall => &[p("contact", String, true)],
            ToolType::PlayMusic => &[p("query", String, true)],
            ToolType::PauseMusic => &[],
            ToolType::AdjustVolume => &[p("level", Number, true)],
            ToolType::GetNews => &[p("topic", String, false)],
            ToolType::TranslateText => &[
                p("text", String, true),
                p("target_language", String, true),
            ],
            ToolType::UnitConversion => &[
                p("value", Number, true),
                p("from_unit", String, true),
                p("to_unit", String, true),
            ],
            ToolType::Calculate => &[p("expression", String, true)],
            ToolType::SetBrightness => &[p("level", Number, true)],
            ToolType::SystemControl => &[p("action", String, true)],
            ToolType::SystemShutdown => &[],
            ToolType::FormatDrive => &[p("drive", String, true)],
            ToolType::DeleteFile => &[p("path", String, true)],
            ToolType::ReadFile => &[p("path", String, true)],
            ToolType::WriteFile => &[
                p("path", String, true),
                p("content", String, true),
            ],
            ToolType::DatabaseQuery => &[p("query", String, true)],
            ToolType::GetLocation => &[],
            ToolType::SetTimezone => &[p("timezone", String, true)],
        }
    }

    /// Whether an OS-class tool whose string arguments should be checked for
    /// shell metacharacters.
    pub fn is_os_class(self) -> bool {
        matches!(
            self,
            ToolType::OpenApplication
                | ToolType::CloseApplication
                | ToolType::SystemControl
                | ToolType::SystemShutdown
                | ToolType::FormatDrive
                | ToolType::DeleteFile
                | ToolType::ReadFile
                | ToolType::WriteFile
        )
    }
}

impl std::fmt::Display for ToolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Per-intent static candidate mapping used only for prompt hinting.
/// The planner validates whatever the LLM actually emits against the full
/// catalog regardless of what is hinted here.
pub fn candidates_for_intent(intent_name: &str) -> Vec<ToolType> {
    let map: BTreeMap<&'static str, &'static [ToolType]> = BTreeMap::from([
        ("get_weather", &[ToolType::GetWeather][..]),
        (
            "open_application_and_search",
            &[ToolType::OpenApplication, ToolType::WebSearch][..],
        ),
        ("web_search", &[ToolType::WebSearch, ToolType::WebFetch][..]),
        ("send_email", &[ToolType::SendEmail, ToolType::ReadEmail][..]),
        (
            "set_reminder",
            &[ToolType::SetReminder, ToolType::CancelReminder][..],
        ),
        ("database_query", &[ToolType::DatabaseQuery][..]),
        (
            "play_music",
            &[ToolType::PlayMusic, ToolType::PauseMusic, ToolType::AdjustVolume][..],
        ),
        (
            "calendar",
            &[ToolType::AddCalendarEvent, ToolType::GetCalendarEvents][..],
        ),
        ("system_control", &[ToolType::SystemControl][..]),
        ("get_news", &[ToolType::GetNews][..]),
        ("translate", &[ToolType::TranslateText][..]),
        ("calculate", &[ToolType::Calculate, ToolType::UnitConversion][..]),
    ]);
    map.get(intent_name).map(|s| s.to_vec()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_but_canonical_on_output() {
        let t = ToolType::parse("get_weather").unwrap();
        assert_eq!(t, ToolType::GetWeather);
        assert_eq!(t.canonical_name(), "GET_WEATHER");

        let t2 = ToolType::parse("GeT_WeAtHeR").unwrap();
        assert_eq!(t2, ToolType::GetWeather);
    }

    #[test]
    fn parse_rejects_unknown_tool() {
        assert!(ToolType::parse("DO_SOMETHING_MADE_UP").is_none());
    }

    #[test]
    fn blacklisted_tools_are_critical_risk() {
        for t in [ToolType::SystemShutdown, ToolType::FormatDrive, ToolType::DeleteFile] {
            assert!(t.is_blacklisted());
            assert_eq!(t.risk_class(), RiskClass::Critical);
        }
    }

    #[test]
    fn candidates_for_unknown_intent_is_empty() {
        assert!(candidates_for_intent("no_such_intent").is_empty());
    }

    #[test]
    fn candidates_for_known_intent_nonempty() {
        assert_eq!(candidates_for_intent("get_weather"), vec![ToolType::GetWeather]);
    }

    #[test]
    fn all_variants_have_unique_canonical_names() {
        let mut names: Vec<&str> = ToolType::ALL.iter().map(|t| t.canonical_name()).collect();
        let len_before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), len_before, "canonical names must be unique");
    }
}
