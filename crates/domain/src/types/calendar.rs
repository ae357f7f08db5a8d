//! Outlook calendar events

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar event as returned by `/me/events` and `/me/calendarView`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body_preview: Option<String>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub organizer: Option<Recipient>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub online_meeting: Option<OnlineMeetingInfo>,
    #[serde(default)]
    pub web_link: Option<String>,
}

impl CalendarEvent {
    /// Attendee addresses with blanks dropped.
    #[must_use]
    pub fn attendee_emails(&self) -> Vec<&str> {
        self.attendees
            .iter()
            .map(|a| a.email_address.address.trim())
            .filter(|address| !address.is_empty())
            .collect()
    }

    #[must_use]
    pub fn organizer_email(&self) -> Option<&str> {
        self.organizer.as_ref().map(|o| o.email_address.address.as_str())
    }

    #[must_use]
    pub fn join_url(&self) -> Option<&str> {
        self.online_meeting.as_ref().and_then(|m| m.join_url.as_deref())
    }
}

/// Graph `dateTimeTimeZone`: a naive timestamp plus a zone name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl DateTimeTimeZone {
    /// UTC timestamp formatted the way Graph expects it.
    #[must_use]
    pub fn utc(at: DateTime<Utc>) -> Self {
        Self {
            date_time: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: Some("UTC".to_string()),
        }
    }

    /// Interpret the value as UTC. Only possible when the zone is UTC or the
    /// timestamp carries an explicit offset.
    #[must_use]
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let value = self.date_time.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
            return Some(parsed.with_timezone(&Utc));
        }

        let is_utc =
            self.time_zone.as_deref().is_some_and(|tz| tz.eq_ignore_ascii_case("utc"));
        if !is_utc {
            return None;
        }

        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email_address: EmailAddress,
    #[serde(default, rename = "type")]
    pub attendee_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMeetingInfo {
    #[serde(default)]
    pub join_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub content_type: String,
    pub content: String,
}

/// Request body for `POST /me/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<EventBody>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    pub is_online_meeting: bool,
}

impl NewCalendarEvent {
    /// Event in UTC with no body, location or attendees.
    #[must_use]
    pub fn new(subject: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            body: None,
            start: DateTimeTimeZone::utc(start),
            end: DateTimeTimeZone::utc(end),
            location: None,
            attendees: Vec::new(),
            is_online_meeting: false,
        }
    }

    #[must_use]
    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        self.body = Some(EventBody { content_type: "text".to_string(), content: text.into() });
        self
    }

    #[must_use]
    pub fn with_location(mut self, name: impl Into<String>) -> Self {
        self.location = Some(Location { display_name: Some(name.into()) });
        self
    }

    #[must_use]
    pub fn with_attendee(mut self, address: impl Into<String>) -> Self {
        self.attendees.push(Attendee {
            email_address: EmailAddress { name: None, address: address.into() },
            attendee_type: Some("required".to_string()),
        });
        self
    }

    #[must_use]
    pub fn online(mut self, enabled: bool) -> Self {
        self.is_online_meeting = enabled;
        self
    }
}
