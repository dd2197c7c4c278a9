use axum::body::Body;
use axum::http::Request;

/// Identity headers the gateway would stamp on an authenticated request.
#[derive(Clone, Copy)]
pub struct Actor {
    pub id: &'static str,
    pub role: &'static str,
    pub name: &'static str,
    pub email: &'static str,
}

pub const LANDLORD: Actor = Actor {
    id: "l1",
    role: "landlord",
    name: "Pat Owner",
    email: "pat@example.com",
};

pub const OTHER_LANDLORD: Actor = Actor {
    id: "l2",
    role: "landlord",
    name: "Riley Rival",
    email: "riley@example.com",
};

pub const TENANT: Actor = Actor {
    id: "t1",
    role: "tenant",
    name: "Sam Renter",
    email: "sam@example.com",
};

pub const OTHER_TENANT: Actor = Actor {
    id: "t2",
    role: "tenant",
    name: "Alex Second",
    email: "alex@example.com",
};

pub fn request(method: &str, uri: &str, actor: Option<Actor>) -> Request<Body> {
    builder(method, uri, actor).body(Body::empty()).expect("request")
}

pub fn json_request(
    method: &str,
    uri: &str,
    actor: Option<Actor>,
    body: serde_json::Value,
) -> Request<Body> {
    builder(method, uri, actor)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn builder(method: &str, uri: &str, actor: Option<Actor>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder
            .header("x-haven-actor", actor.id)
            .header("x-haven-role", actor.role)
            .header("x-haven-name", actor.name)
            .header("x-haven-email", actor.email);
    }
    builder
}
