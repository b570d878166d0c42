/// Separator between the two user ids of a conversation key
pub const CONVERSATION_KEY_SEPARATOR: &str = "_";

/// Realtime event: a message addressed to the viewer was created
pub const EVENT_MESSAGE_NEW: &str = "message:new";

/// Realtime event: the backend acknowledged a message the viewer sent
pub const EVENT_MESSAGE_SENT: &str = "message:sent";

/// Display name used for the viewer when the directory lacks an entry
pub const VIEWER_FALLBACK_NAME: &str = "You";

/// Broadcast tags
pub const TAG_EVERYONE: &str = "@everyone";
pub const TAG_COACHES: &str = "@coaches";
pub const TAG_MEMBERS: &str = "@members";

/// Default REST API base URL (local development)
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Capacity of the realtime event channel
pub const REALTIME_CHANNEL_CAPACITY: usize = 256;

/// Placeholder display name for a user missing from the directory
pub fn placeholder_name(id: i64) -> String {
    format!("User {id}")
}
