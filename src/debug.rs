#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub fn debug_agent(id: crate::AgentId, fraction: f64) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "agent",
            "id": format!("{:?}", id),
            "fraction": fraction,
        }))
    })
}

#[allow(unused)]
pub fn debug_separation(pair: [crate::AgentId; 2], distance: f64) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "separation",
            "pair": [format!("{:?}", pair[0]), format!("{:?}", pair[1])],
            "distance": distance,
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
