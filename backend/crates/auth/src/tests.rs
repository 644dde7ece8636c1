//! HTTP scenarios for the auth crate
//! Every request goes through `api_router` on an in-memory store.

#[cfg(test)]
mod http_tests {
    use std::time::Duration;

    use audit::{ActivityFilter, ActivityLog, ActivityLogRepository, ActivityType, Page};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use kernel::id::UserId;
    use platform::mail::{HttpMailer, HttpMailerConfig, Mailer, Outbox};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::application::notifications::extract_code;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::email::Email;
    use crate::{AuthAppState, AuthConfig, MemoryStore, api_router};

    const PASSWORD: &str = "correct horse battery";

    struct TestApp {
        app: Router,
        store: MemoryStore,
        outbox: Outbox,
    }

    impl TestApp {
        fn new() -> Self {
            Self::with_config(AuthConfig::for_tests())
        }

        fn with_config(config: AuthConfig) -> Self {
            Self::with_mailer(config, Mailer::Outbox(Outbox::new()))
        }

        fn with_mailer(config: AuthConfig, mailer: Mailer) -> Self {
            let store = MemoryStore::new();
            let outbox = mailer.outbox().cloned().unwrap_or_default();
            let state = AuthAppState::new(store.clone(), config, mailer);
            Self {
                app: api_router(state),
                store,
                outbox,
            }
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            self.send(Method::GET, uri, token, None).await
        }

        async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
            self.send(Method::POST, uri, token, Some(body)).await
        }

        async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
            self.send(Method::PUT, uri, Some(token), Some(body)).await
        }

        async fn latest_code(&self, email: &str) -> String {
            let mail = self.outbox.latest_for(email).await.expect("no mail sent");
            extract_code(&mail.text).expect("no code in mail").to_string()
        }

        async fn sign_up(&self, name: &str, email: &str) {
            let (status, _) = self
                .post(
                    "/auth/signup",
                    None,
                    json!({ "name": name, "email": email, "password": PASSWORD }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        async fn confirm(&self, email: &str) {
            let code = self.latest_code(email).await;
            let (status, _) = self
                .post("/auth/confirm-signup", None, json!({ "email": email, "code": code }))
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
            self.post("/auth/login", None, json!({ "email": email, "password": password }))
                .await
        }

        /// Sign up, confirm, log in; returns (user id, token)
        async fn account(&self, name: &str, email: &str) -> (String, String) {
            self.sign_up(name, email).await;
            self.confirm(email).await;
            let (status, body) = self.login(email, PASSWORD).await;
            assert_eq!(status, StatusCode::OK);
            (
                body["user"]["id"].as_str().unwrap().to_string(),
                body["token"].as_str().unwrap().to_string(),
            )
        }

        /// An account promoted to `role` by `developer`
        async fn account_with_role(
            &self,
            developer: &str,
            name: &str,
            email: &str,
            role: &str,
        ) -> (String, String) {
            let (id, token) = self.account(name, email).await;
            let (status, _) = self
                .put(
                    &format!("/admin/users/{id}/role"),
                    developer,
                    json!({ "role": role }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            (id, token)
        }

        async fn logs_for(&self, subject: &str, activity_type: ActivityType) -> Vec<ActivityLog> {
            let filter = ActivityFilter {
                subject: Some(subject.parse::<UserId>().unwrap()),
                activity_type: Some(activity_type),
                ..Default::default()
            };
            self.store
                .activity()
                .find(&filter, Page::first(100))
                .await
                .unwrap()
        }

        /// Records arrive asynchronously; wait for at least one, then settle
        async fn settled_logs(&self, subject: &str, activity_type: ActivityType) -> Vec<ActivityLog> {
            for _ in 0..50 {
                if !self.logs_for(subject, activity_type.clone()).await.is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.logs_for(subject, activity_type).await
        }
    }

    // ------------------------------------------------------------------
    // Account lifecycle
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_first_account_becomes_developer() {
        let t = TestApp::new();
        let (_, first) = t.account("Dev One", "dev@example.com").await;
        let (_, second) = t.account("Stu Dent", "student@example.com").await;

        let (_, me) = t.get("/auth/me", Some(&first)).await;
        assert_eq!(me["role"], "Developer");

        let (_, me) = t.get("/auth/me", Some(&second)).await;
        assert_eq!(me["role"], "Student");
        assert_eq!(me["isConfirmed"], true);
        assert!(me.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_allow_listed_email_becomes_developer() {
        let t = TestApp::with_config(
            AuthConfig::for_tests().with_developer_emails(["Lead@Example.com"]),
        );
        t.account("First User", "first@example.com").await;
        let (_, token) = t.account("Lead Dev", "lead@example.com").await;

        let (_, me) = t.get("/auth/me", Some(&token)).await;
        assert_eq!(me["role"], "Developer");
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let t = TestApp::new();
        t.sign_up("Dev One", "dev@example.com").await;

        let (status, _) = t
            .post(
                "/auth/signup",
                None,
                json!({ "name": "Again", "email": "DEV@example.com", "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_confirmation_code_is_single_use() {
        let t = TestApp::new();
        t.sign_up("Dev One", "dev@example.com").await;

        let (status, _) = t.login("dev@example.com", PASSWORD).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = t
            .post(
                "/auth/confirm-signup",
                None,
                json!({ "email": "dev@example.com", "code": "000000" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid or expired code");

        let code = t.latest_code("dev@example.com").await;
        let confirm = json!({ "email": "dev@example.com", "code": code });
        let (status, _) = t.post("/auth/confirm-signup", None, confirm.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t.post("/auth/confirm-signup", None, confirm).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = t.login("dev@example.com", PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resend_confirmation() {
        let t = TestApp::new();
        t.sign_up("Dev One", "dev@example.com").await;
        let first = t.latest_code("dev@example.com").await;

        let (status, _) = t
            .post("/auth/resend-confirmation", None, json!({ "email": "dev@example.com" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(t.outbox.for_recipient("dev@example.com").await.len(), 2);

        let second = t.latest_code("dev@example.com").await;
        if first != second {
            let (status, _) = t
                .post(
                    "/auth/confirm-signup",
                    None,
                    json!({ "email": "dev@example.com", "code": first }),
                )
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        t.confirm("dev@example.com").await;

        let (status, _) = t
            .post("/auth/resend-confirmation", None, json!({ "email": "dev@example.com" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = t
            .post("/auth/resend-confirmation", None, json!({ "email": "nobody@example.com" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let t = TestApp::new();
        t.account("Dev One", "dev@example.com").await;

        let (wrong_status, wrong) = t.login("dev@example.com", "not it").await;
        let (unknown_status, unknown) = t.login("nobody@example.com", PASSWORD).await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong["detail"], unknown["detail"]);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let t = TestApp::new();
        t.account("Dev One", "dev@example.com").await;

        let (status, _) = t
            .post("/auth/request-password-reset", None, json!({ "email": "dev@example.com" }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t
            .post(
                "/auth/reset-password",
                None,
                json!({ "email": "dev@example.com", "code": "000000", "newPassword": "brand new" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let code = t.latest_code("dev@example.com").await;
        let (status, _) = t
            .post(
                "/auth/reset-password",
                None,
                json!({ "email": "dev@example.com", "code": code, "newPassword": "brand new" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t.login("dev@example.com", PASSWORD).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = t.login("dev@example.com", "brand new").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reset_checks_code_before_password() {
        let t = TestApp::new();
        t.account("Dev One", "dev@example.com").await;
        t.post("/auth/request-password-reset", None, json!({ "email": "dev@example.com" }))
            .await;
        let code = t.latest_code("dev@example.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        // A wrong code is reported even when the password would fail policy
        let (status, body) = t
            .post(
                "/auth/reset-password",
                None,
                json!({ "email": "dev@example.com", "code": wrong, "newPassword": "   " }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid or expired code");

        // A rejected password leaves the right code usable
        let (status, body) = t
            .post(
                "/auth/reset-password",
                None,
                json!({ "email": "dev@example.com", "code": code, "newPassword": "   " }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_ne!(body["detail"], "Invalid or expired code");

        let (status, _) = t
            .post(
                "/auth/reset-password",
                None,
                json!({ "email": "dev@example.com", "code": code, "newPassword": "brand new" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_password_reset_unknown_email() {
        let t = TestApp::new();
        let (status, _) = t
            .post("/auth/request-password-reset", None, json!({ "email": "nobody@example.com" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut config = AuthConfig::for_tests();
        config.reset_discloses_unknown_email = false;
        let t = TestApp::with_config(config);
        let (status, body) = t
            .post("/auth/request-password-reset", None, json!({ "email": "nobody@example.com" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "If an account exists for this email, a password reset code has been sent"
        );
        assert!(t.outbox.all().await.is_empty());
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_missing_and_forged_tokens() {
        let t = TestApp::new();
        t.account("Dev One", "dev@example.com").await;

        let (status, body) = t.get("/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "No token, authorization denied");

        let (status, _) = t.get("/auth/me", Some("abc.def")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let t = TestApp::new();
        let (_, token) = t.account("Dev One", "dev@example.com").await;

        let (status, _) = t.send(Method::POST, "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t.get("/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = t.login("dev@example.com", PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deactivated_user_is_locked_out() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, student) = t.account("Stu Dent", "student@example.com").await;

        let (status, body) = t
            .put(
                &format!("/admin/users/{student_id}/status"),
                &dev,
                json!({ "isActive": false }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["isActive"], false);

        let (status, _) = t.get("/auth/me", Some(&student)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = t.login("student@example.com", PASSWORD).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid credentials or inactive account");
    }

    #[tokio::test]
    async fn test_role_comes_from_store_not_token() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        let (admin_id, admin) = t.account("Ad Min", "admin@example.com").await;

        let (status, _) = t.get("/admin/users", Some(&admin)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t
            .put(&format!("/admin/users/{admin_id}/role"), &dev, json!({ "role": "Admin" }))
            .await;
        assert_eq!(status, StatusCode::OK);

        // Same token, new role
        let (status, _) = t.get("/admin/users", Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);
    }

    // ------------------------------------------------------------------
    // Role hierarchy
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_admin_cannot_touch_developer() {
        let t = TestApp::new();
        let (dev_id, dev) = t.account("Dev One", "dev@example.com").await;
        let (_, admin) = t
            .account_with_role(&dev, "Ad Min", "admin@example.com", "Admin")
            .await;
        let (student_id, _) = t.account("Stu Dent", "student@example.com").await;

        let (status, _) = t
            .put(&format!("/admin/users/{dev_id}/role"), &admin, json!({ "role": "Student" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t
            .put(&format!("/admin/users/{dev_id}/status"), &admin, json!({ "isActive": false }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = t
            .put(
                &format!("/admin/users/{student_id}/role"),
                &admin,
                json!({ "role": "Developer" }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["detail"], "Only Developer can assign Developer role.");

        let (status, _) = t
            .put(
                &format!("/admin/users/{student_id}/role"),
                &admin,
                json!({ "role": "Teacher" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t
            .send(Method::DELETE, &format!("/admin/users/{student_id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_teacher_reads_students_only() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        let (_, teacher) = t
            .account_with_role(&dev, "Tea Cher", "teacher@example.com", "Teacher")
            .await;
        let (other_id, _) = t
            .account_with_role(&dev, "Other Teacher", "other@example.com", "Teacher")
            .await;
        let (student_id, _) = t.account("Stu Dent", "student@example.com").await;

        let (status, body) = t.get(&format!("/admin/users/{student_id}"), Some(&teacher)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "student@example.com");

        let (status, _) = t.get(&format!("/admin/users/{other_id}"), Some(&teacher)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t
            .put(
                &format!("/admin/users/{student_id}/status"),
                &teacher,
                json!({ "isActive": false }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = t.get("/admin/teacher/students", Some(&teacher)).await;
        assert_eq!(status, StatusCode::OK);
        let students = body.as_array().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0]["id"], student_id.as_str());

        let (status, _) = t
            .get(&format!("/admin/users/{student_id}/activity"), Some(&teacher))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_target_is_not_found() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;

        let (status, _) = t.get("/admin/users/not-a-uuid", Some(&dev)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let missing = UserId::new().to_string();
        let (status, _) = t.get(&format!("/admin/users/{missing}"), Some(&dev)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_self_modification_rejected() {
        let t = TestApp::new();
        let (dev_id, dev) = t.account("Dev One", "dev@example.com").await;

        let (status, _) = t
            .put(&format!("/admin/users/{dev_id}/role"), &dev, json!({ "role": "Student" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t
            .send(Method::DELETE, &format!("/admin/users/{dev_id}"), Some(&dev), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, me) = t.get("/auth/me", Some(&dev)).await;
        assert_eq!(me["role"], "Developer");
    }

    #[tokio::test]
    async fn test_unknown_role_is_bad_request() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, _) = t.account("Stu Dent", "student@example.com").await;

        let (status, _) = t
            .put(
                &format!("/admin/users/{student_id}/role"),
                &dev,
                json!({ "role": "Principal" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_developer_deletes_user() {
        let t = TestApp::new();
        let (dev_id, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, student) = t.account("Stu Dent", "student@example.com").await;

        let (status, body) = t
            .send(Method::DELETE, &format!("/admin/users/{student_id}"), Some(&dev), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "student@example.com");

        let (status, _) = t.get("/auth/me", Some(&student)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let logs = t.settled_logs(&student_id, ActivityType::UserDeleted).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].performed_by().to_string(), dev_id);
        assert_eq!(
            logs[0].details()["deletedUser"]["email"],
            "student@example.com"
        );
    }

    // ------------------------------------------------------------------
    // Audit trail
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_role_change_recorded_once() {
        let t = TestApp::new();
        let (dev_id, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, _) = t
            .account_with_role(&dev, "Stu Dent", "student@example.com", "Teacher")
            .await;

        let logs = t.settled_logs(&student_id, ActivityType::RoleChanged).await;
        assert_eq!(logs.len(), 1);
        let log = &logs[0];
        assert_eq!(log.subject_user_id().to_string(), student_id);
        assert_eq!(log.performed_by().to_string(), dev_id);
        assert_eq!(log.details()["oldRole"], "Student");
        assert_eq!(log.details()["newRole"], "Teacher");
    }

    #[tokio::test]
    async fn test_status_change_recorded_once_with_actor() {
        let t = TestApp::new();
        let (dev_id, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, _) = t.account("Stu Dent", "student@example.com").await;

        let (status, body) = t
            .put(
                &format!("/admin/users/{student_id}/status"),
                &dev,
                json!({ "isActive": false }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["isActive"], false);

        let logs = t.settled_logs(&student_id, ActivityType::StatusChanged).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].performed_by().to_string(), dev_id);
        assert_eq!(logs[0].details()["oldStatus"], true);
        assert_eq!(logs[0].details()["newStatus"], false);
    }

    #[tokio::test]
    async fn test_logout_recorded_once() {
        let t = TestApp::new();
        let (dev_id, token) = t.account("Dev One", "dev@example.com").await;

        let (status, _) = t.send(Method::POST, "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        // A second logout with the revoked token is rejected and not recorded
        let (status, _) = t.send(Method::POST, "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let logs = t.settled_logs(&dev_id, ActivityType::Logout).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].performed_by().to_string(), dev_id);
        assert_eq!(logs[0].subject_user_id().to_string(), dev_id);
    }

    #[tokio::test]
    async fn test_signup_survives_mail_failure() {
        // Nothing listens on the discard port; the relay call fails fast
        let relay = HttpMailer::new(HttpMailerConfig {
            endpoint: "http://127.0.0.1:9/send".into(),
            api_key: None,
            from: "noreply@example.com".into(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let t = TestApp::with_mailer(AuthConfig::for_tests(), Mailer::Http(relay));

        t.sign_up("Dev One", "dev@example.com").await;

        let email = Email::new("dev@example.com").unwrap();
        let user = UserRepository::find_by_email(&t.store, &email)
            .await
            .unwrap()
            .unwrap();
        assert!(!user.is_confirmed);

        let logs = t
            .settled_logs(&user.user_id.to_string(), ActivityType::Signup)
            .await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].details()["emailDispatched"], false);
    }

    #[tokio::test]
    async fn test_login_recorded_for_self() {
        let t = TestApp::new();
        let (dev_id, _) = t.account("Dev One", "dev@example.com").await;

        let logs = t.settled_logs(&dev_id, ActivityType::Login).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].performed_by().to_string(), dev_id);

        let signups = t.settled_logs(&dev_id, ActivityType::Signup).await;
        assert_eq!(signups.len(), 2);
    }

    #[tokio::test]
    async fn test_denied_request_leaves_no_record() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, student) = t.account("Stu Dent", "student@example.com").await;

        let (status, _) = t.get("/admin/users", Some(&student)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let logs = t.settled_logs(&student_id, ActivityType::UserManagement).await;
        assert!(logs.is_empty());

        let (status, body) = t.get("/admin/users?role=Student", Some(&dev)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_audit_outage_does_not_change_outcome() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, _) = t.account("Stu Dent", "student@example.com").await;

        t.store.activity().set_outage(true);
        let (status, body) = t
            .put(
                &format!("/admin/users/{student_id}/role"),
                &dev,
                json!({ "role": "Teacher" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "Teacher");

        let (status, _) = t.login("student@example.com", PASSWORD).await;
        assert_eq!(status, StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        t.store.activity().set_outage(false);
        assert!(t.logs_for(&student_id, ActivityType::RoleChanged).await.is_empty());
    }

    #[tokio::test]
    async fn test_activity_views() {
        let t = TestApp::new();
        let (dev_id, dev) = t.account("Dev One", "dev@example.com").await;
        let (student_id, _) = t
            .account_with_role(&dev, "Stu Dent", "student@example.com", "Teacher")
            .await;
        t.settled_logs(&student_id, ActivityType::RoleChanged).await;

        let (status, body) = t
            .get(
                &format!("/admin/users/{student_id}/activity?type=role_changed"),
                Some(&dev),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let logs = body.as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["userId"], student_id.as_str());
        assert_eq!(logs[0]["performedBy"]["id"], dev_id.as_str());

        let (status, body) = t.get("/admin/activity?limit=2&page=1", Some(&dev)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logs"].as_array().unwrap().len(), 2);
        assert_eq!(body["pagination"]["limit"], 2);
        assert!(body["pagination"]["total"].as_u64().unwrap() >= 2);
        assert!(body["logs"][0]["userId"]["email"].is_string());

        let (status, _) = t.get("/admin/activity?startDate=yesterday", Some(&dev)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_counts_roles() {
        let t = TestApp::new();
        let (_, dev) = t.account("Dev One", "dev@example.com").await;
        t.account("Stu Dent", "student@example.com").await;
        t.account("Stu Two", "student2@example.com").await;

        let (status, body) = t.get("/admin/dashboard", Some(&dev)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["userCounts"],
            json!([
                { "role": "Developer", "count": 1 },
                { "role": "Student", "count": 2 },
            ])
        );
        let registrations = body["registrations"].as_array().unwrap();
        assert_eq!(registrations.len(), 1);
        assert_eq!(registrations[0]["count"], 3);
    }

    // ------------------------------------------------------------------
    // Client submissions
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_submit_activity() {
        let t = TestApp::new();
        let (user_id, token) = t.account("Dev One", "dev@example.com").await;

        let (status, body) = t
            .post(
                "/activity-log",
                Some(&token),
                json!({ "type": "chapter_viewed", "details": { "chapter": "Kinematics" } }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["log"]["type"], "chapter_viewed");
        assert_eq!(body["log"]["userId"], user_id.as_str());

        let logs = t.settled_logs(&user_id, ActivityType::ChapterViewed).await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].details()["chapter"], "Kinematics");
    }

    #[tokio::test]
    async fn test_submit_unknown_activity_type() {
        let t = TestApp::new();
        let (_, token) = t.account("Dev One", "dev@example.com").await;
        let body = json!({ "type": "made_up_type" });

        let (status, _) = t.post("/activity-log", Some(&token), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut config = AuthConfig::for_tests();
        config.development = false;
        let t = TestApp::with_config(config);
        let (_, token) = t.account("Dev One", "dev@example.com").await;
        let (status, body) = t.post("/activity-log", Some(&token), body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["log"]["type"], "made_up_type");
    }

    // ------------------------------------------------------------------
    // Development outbox
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_outbox_inspection() {
        let t = TestApp::new();
        t.sign_up("Dev One", "dev@example.com").await;

        let (status, body) = t.get("/auth/mock-emails?email=dev@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = t.get("/auth/latest-code?email=dev@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], t.latest_code("dev@example.com").await.as_str());

        let (status, _) = t.get("/auth/latest-code", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = t.get("/auth/latest-code?email=nobody@example.com", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_outbox_hidden_outside_development() {
        let mut config = AuthConfig::for_tests();
        config.development = false;
        let t = TestApp::with_config(config);
        t.sign_up("Dev One", "dev@example.com").await;

        let (status, _) = t.get("/auth/mock-emails", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
