//! Hosts the service ships with, used to seed an empty store

use super::definition::{HeadersMap, NewHost};

/// The three public providers the application started out with.
///
/// NodeImage needs a key; without one it is seeded disabled so the first
/// upload doesn't waste an attempt on it.
pub fn builtin_hosts(nodeimage_api_key: Option<&str>) -> Vec<NewHost> {
    let mut xinyew = NewHost::new("xinyew", "https://api.xinyew.cn/api/jdtc", "data.url");
    xinyew.success_field = Some("errno".to_string());
    xinyew.success_value = Some("0".to_string());
    xinyew.priority = 30;
    xinyew.timeout_ms = 60_000;
    xinyew.description = Some("Default public host".to_string());

    let mut game4399 = NewHost::new(
        "4399",
        "https://api.h5wan.4399sj.com/html5/report/upload",
        "data.file",
    );
    game4399.headers = HeadersMap::from([("device".to_string(), "main_pc".to_string())]);
    game4399.success_value = Some("1000".to_string());
    game4399.success_field = Some("code".to_string());
    game4399.priority = 20;
    game4399.timeout_ms = 60_000;
    game4399.description = Some("Signed links; the query string is dropped".to_string());

    let key = nodeimage_api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string);
    let mut nodeimage = NewHost::new("NodeImage", "https://api.nodeimage.com/api/upload", "url");
    nodeimage.form_field = "image".to_string();
    nodeimage.requires_api_key = true;
    nodeimage.is_enabled = key.is_some();
    nodeimage.api_key = key;
    nodeimage.success_field = Some("success".to_string());
    nodeimage.success_value = Some("true".to_string());
    nodeimage.priority = 10;
    nodeimage.timeout_ms = 60_000;

    vec![xinyew, game4399, nodeimage]
}
