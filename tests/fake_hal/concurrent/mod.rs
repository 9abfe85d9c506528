use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;

lazy_static! {
    static ref EVENT_LOG_MAP: Mutex<HashMap<&'static str, Vec<bool>>> = Mutex::new(HashMap::new());
    static ref VALUE_LOG_MAP: Mutex<HashMap<&'static str, Vec<u64>>> = Mutex::new(HashMap::new());
}

pub fn reset_named_events(name: &'static str) {
    let mut map = EVENT_LOG_MAP.lock().unwrap();
    map.insert(name, Vec::new());
}

pub fn push_named_event(name: &str, is_high: bool) {
    let mut map = EVENT_LOG_MAP.lock().unwrap();
    map.get_mut(name).unwrap().push(is_high);
}

pub fn get_named_events(name: &str) -> Vec<bool> {
    let map = EVENT_LOG_MAP.lock().unwrap();
    map.get(name).unwrap().clone()
}

pub fn reset_named_values(name: &'static str) {
    let mut map = VALUE_LOG_MAP.lock().unwrap();
    map.insert(name, Vec::new());
}

pub fn push_named_value(name: &str, value: u64) {
    let mut map = VALUE_LOG_MAP.lock().unwrap();
    map.get_mut(name).unwrap().push(value);
}

pub fn get_named_values(name: &str) -> Vec<u64> {
    let map = VALUE_LOG_MAP.lock().unwrap();
    map.get(name).unwrap().clone()
}
