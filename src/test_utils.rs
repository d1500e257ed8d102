use url::Url;

#[macro_export]
/// Creates a mock web server which answers GET requests with a
/// predefined status and, optionally, a JSON body
macro_rules! mock_server {
    ($status:expr) => {{
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new($status))
            .mount(&mock_server)
            .await;
        mock_server
    }};
    ($status:expr, $body:expr) => {{
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new($status).set_body_json($body))
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// Helper method to convert a string into a URL
///
/// # Panics
///
/// This panics on error, so it should only be used for testing
pub(crate) fn website(url: &str) -> Url {
    Url::parse(url).expect("Expected valid website URL")
}
