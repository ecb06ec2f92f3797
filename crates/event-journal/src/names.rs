//! Well-known event names.

/// Recorded once when a session begins.
pub const SESSION_START: &str = "session_start";
/// Connectivity came back.
pub const NETWORK_ONLINE: &str = "network_online";
/// Connectivity was lost.
pub const NETWORK_OFFLINE: &str = "network_offline";
pub const WHATSAPP_CLICK: &str = "whatsapp_click";
pub const PRODUCT_CLICK: &str = "product_click";
pub const FORM_SUBMIT: &str = "form_submit";
