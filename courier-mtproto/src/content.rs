//! Content-related classification.

/// Service constructors that do not participate in acknowledgment or
/// ordering accounting. Everything else is content-related.
const CONTENT_UNRELATED: &[&str] = &[
    "rpc_result",
    "rpc_error",
    "rpc_drop_answer",
    "rpc_answer_unknown",
    "rpc_answer_dropped_running",
    "rpc_answer_dropped",
    "get_future_salts",
    "future_salt",
    "future_salts",
    "ping",
    "pong",
    "ping_delay_disconnect",
    "destroy_session",
    "destroy_session_ok",
    "destroy_session_none",
    "new_session_created",
    "msg_container",
    "msg_copy",
    "gzip_packed",
    "http_wait",
    "msgs_ack",
    "bad_msg_notification",
    "bad_server_salt",
    "msgs_state_req",
    "msgs_state_info",
    "msgs_all_info",
    "msg_detailed_info",
    "msg_new_detailed_info",
    "msg_resend_req",
    "msg_resend_ans_req",
];

/// Whether `name` is a content-related method or object.
///
/// Content-related messages take odd sequence numbers and must be
/// acknowledged by the server; service messages do not.
pub fn content_related(name: &str) -> bool {
    !CONTENT_UNRELATED.contains(&name)
}
