pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

/// Read an error body and return its machine-readable `code`.
pub async fn read_error_code(response: axum::response::Response) -> String {
    let payload = read_json(response).await;
    payload["code"].as_str().expect("error code").to_string()
}
