//! Microsoft Graph resource types
//!
//! Shapes follow the Graph v1.0 JSON payloads (camelCase on the wire). Only
//! the properties the keywords expose are modelled; unknown fields are
//! ignored on deserialization.

pub mod calendar;
pub mod directory;
pub mod drive;
pub mod odata;
pub mod permissions;
pub mod sites;

pub use calendar::{
    Attendee, CalendarEvent, DateTimeTimeZone, EmailAddress, EventBody, Location,
    NewCalendarEvent, OnlineMeetingInfo, Recipient,
};
pub use directory::User;
pub use drive::{DriveItem, FileFacet, FolderFacet, IdentitySet, ItemReference, UserIdentity};
pub use odata::ODataCollection;
pub use permissions::PermissionBundle;
pub use sites::{ListItem, Site, SiteList};
