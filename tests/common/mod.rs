// Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use serde_json::Value;

/// Build the full application around an `AppState`, wired like `main`
macro_rules! init_app {
    ($state:expr) => {{
        let state: home_loan_helper::AppState = $state;
        let frontend_url = state.settings.application.frontend_url.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state))
                .app_data(home_loan_helper::handlers::json_config())
                .app_data(home_loan_helper::handlers::query_config())
                .wrap(actix_web::middleware::from_fn(
                    home_loan_helper::middleware::rate_limit,
                ))
                .wrap(home_loan_helper::middleware::security_headers())
                .wrap(home_loan_helper::middleware::cors(&frontend_url))
                .configure(home_loan_helper::configure_services),
        )
        .await
    }};
}

pub async fn json_body<B: MessageBody>(res: ServiceResponse<B>) -> Value {
    let bytes = actix_web::test::read_body(res).await;
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub fn response_cookie<B>(res: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(Cookie::into_owned)
}

pub fn header<'a, B>(res: &'a ServiceResponse<B>, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
}
