//! Fake wall backend served over HTTP for integration tests

#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

use tiny_http::{Header, Method, Response, Server};

pub const WALL_ONE: &str = r#"{
    "id": 1, "width": 90, "height": 30, "is_gallery": false,
    "pictures_to_hang": {
        "p1": {"x": 0, "y": 0, "width": 10, "height": 10, "image": "img/red.png"},
        "p2": {"x": 20, "y": 0, "width": 10, "height": 20, "image": null}
    }
}"#;

pub const GALLERY_THREE: &str = r#"{
    "id": 3, "width": 90, "height": 30,
    "pictures_to_hang": {
        "a": {"x": 5, "y": 2, "width": 10, "height": 20, "image": null},
        "b": {"x": 20, "y": 2, "width": 10, "height": 10, "image": null}
    }
}"#;

pub const TIME_CHART: &str = r#"{
    "labels": ["20160209", "20160210"],
    "datasets": [
        {"label": "code", "fillColor": "rgba(75, 173, 158, 1)", "strokeColor": "rgba(75, 173, 158, 1)", "data": [2.5, 4]}
    ]
}"#;

pub const TIME_SPARK: &str = r##"{
    "all_plots": [
        {"labels": ["a", "b"], "datasets": [{"label": "code", "fillColor": "#4bad9e", "strokeColor": "#4bad9e", "data": [0.5, 1]}]}
    ],
    "all_labels": ["Coding"],
    "all_types": ["code"]
}"##;

/// One request as the fake backend saw it
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub url: String,
    pub body: String,
    pub user_agent: Option<String>,
}

pub struct FakeBackend {
    pub base_url: String,
    pub seen: Arc<Mutex<Vec<Seen>>>,
}

fn red_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
    out
}

fn json(body: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(body).with_header("Content-Type: application/json".parse::<Header>().unwrap())
}

/// Start the fake backend on an ephemeral port
pub fn start() -> FakeBackend {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);

    std::thread::spawn(move || {
        let mut next_wall = 40u64;
        for mut request in server.incoming_requests() {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let url = request.url().to_string();
            let user_agent = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("User-Agent"))
                .map(|h| h.value.to_string());
            record.lock().unwrap().push(Seen {
                method: request.method().to_string(),
                url: url.clone(),
                body: body.clone(),
                user_agent,
            });

            let path = url.split('?').next().unwrap_or_default().to_string();
            let resp = match (request.method(), path.as_str()) {
                (Method::Get, "/getwall.json") if url.ends_with("wallid=1") => json(WALL_ONE),
                (Method::Get, "/getwall.json") => json(r#"{"id": null}"#),
                (Method::Get, "/getgallery.json") if url.ends_with("galleryid=3") => json(GALLERY_THREE),
                (Method::Get, "/getgallery.json") => json(r#"{"id": null}"#),
                (Method::Post, "/arrange.json") => {
                    next_wall += 1;
                    json(&format!(r#"{{"id": {}}}"#, next_wall))
                }
                (Method::Post, "/save-wall.json") => {
                    let id = body.trim_start_matches("wall_id=").to_string();
                    json(&format!(r#"{{"wall_id": {}}}"#, id))
                }
                (Method::Get, "/gettime.json") => json(TIME_CHART),
                (Method::Get, "/gettimespark.json") => json(TIME_SPARK),
                (Method::Get, "/img/red.png") => Response::from_data(red_png())
                    .with_header("Content-Type: image/png".parse::<Header>().unwrap()),
                (Method::Get, "/broken.json") => json("{not json"),
                _ => Response::from_string("not found").with_status_code(404),
            };
            let _ = request.respond(resp);
        }
    });

    FakeBackend {
        base_url: format!("http://127.0.0.1:{}/", port),
        seen,
    }
}
