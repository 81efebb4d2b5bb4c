use trellis_core::{
    Container, Controller, Error, Request, Router, action, controller, handler,
};

struct UsersController;

impl Controller for UsersController {
    fn call(&self, action: &str, params: Vec<String>) -> Result<String, Error> {
        match action {
            "index" => Ok("all users".to_string()),
            "show" => Ok(format!("user {}", params.join(","))),
            other => Err(Error::RouteNotFound(format!("unknown action [{}]", other))),
        }
    }
}

fn container_with_users() -> Container {
    let container = Container::new();
    container.singleton_factory("users", |_, _| Ok(controller(UsersController)));
    container
}

#[test]
fn test_literal_route_dispatch() {
    let mut router = Router::new();
    router.get("/", handler(|_| Ok("home".into()))).unwrap();

    let out = router
        .dispatch(&Container::new(), &Request::new("GET", "/"))
        .unwrap();
    assert_eq!(out, "home");
}

#[test]
fn test_controller_target_resolved_through_container() {
    let mut router = Router::new();
    router.get("users", action("users@index").unwrap()).unwrap();
    router.get("users/(:num)", action("users@show").unwrap()).unwrap();

    let container = container_with_users();
    assert_eq!(
        router
            .dispatch(&container, &Request::new("GET", "/users"))
            .unwrap(),
        "all users"
    );
    assert_eq!(
        router
            .dispatch(&container, &Request::new("GET", "/users/42"))
            .unwrap(),
        "user 42"
    );
}

#[test]
fn test_pattern_captures_become_params() {
    let mut router = Router::new();
    router
        .get(
            "posts/(:num)/comments/(:num)",
            handler(|params| Ok(params.join("-"))),
        )
        .unwrap();

    let out = router
        .dispatch(&Container::new(), &Request::new("GET", "/posts/7/comments/9"))
        .unwrap();
    assert_eq!(out, "7-9");
}

#[test]
fn test_num_pattern_rejects_non_digits() {
    let mut router = Router::new();
    router.get("users/:num", handler(|_| Ok("ok".into()))).unwrap();

    let result = router.dispatch(&Container::new(), &Request::new("GET", "/users/abc"));
    assert!(matches!(result, Err(Error::RouteNotFound(_))));
}

#[test]
fn test_method_mismatch_reports_method_not_allowed() {
    let mut router = Router::new();
    router.post("users", handler(|_| Ok("created".into()))).unwrap();

    let result = router.dispatch(&Container::new(), &Request::new("GET", "/users"));
    assert!(matches!(result, Err(Error::MethodNotAllowed(_))));
}

#[test]
fn test_any_registers_get_and_post() {
    let mut router = Router::new();
    router.any("ping", handler(|_| Ok("pong".into()))).unwrap();

    let container = Container::new();
    assert_eq!(
        router.dispatch(&container, &Request::new("GET", "ping")).unwrap(),
        "pong"
    );
    assert_eq!(
        router.dispatch(&container, &Request::new("POST", "ping")).unwrap(),
        "pong"
    );
}

#[test]
fn test_unknown_route_is_not_found() {
    let router = Router::new();
    let result = router.dispatch(&Container::new(), &Request::new("GET", "/nope"));
    assert!(matches!(result, Err(Error::RouteNotFound(_))));
}

#[test]
fn test_unresolvable_controller_propagates() {
    let mut router = Router::new();
    router.get("users", action("users@index").unwrap()).unwrap();

    // No "users" service registered and no metadata to auto-resolve.
    let result = router.dispatch(&Container::new(), &Request::new("GET", "/users"));
    assert!(matches!(result, Err(Error::BindingResolution(_))));
}
