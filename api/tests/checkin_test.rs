mod helpers;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use api::auth::generate_jwt;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, NaiveTime, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    use db::models::{
        attendance::{AttendanceStatus, AttendanceWrite, Model as RecordModel},
        attendance_session::Model as SessionModel,
        class::Model as ClassModel,
        class_student::{Column as EnrollCol, Entity as EnrollEntity, EnrollmentSource, Model as EnrollModel},
        user::Model as UserModel,
    };
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    use crate::helpers::make_test_app;

    struct TestCtx {
        admin: UserModel,
        teacher: UserModel,
        student: UserModel,
        class: ClassModel,
        session: SessionModel,
        token: String,
    }

    /// Seeds a class with one enrolled student and an open session that
    /// already has a QR token. The session has no end time, so there is no
    /// scheduled deadline to trip over.
    async fn setup(db: &sea_orm::DatabaseConnection, auto_enroll: bool) -> TestCtx {
        let admin = UserModel::create(db, "admin1", "admin1@test.com", "password", true)
            .await
            .unwrap();
        let teacher = UserModel::create(db, "lect1", "lect1@test.com", "password", false)
            .await
            .unwrap();
        let student = UserModel::create(db, "u22000001", "stu1@test.com", "password", false)
            .await
            .unwrap();

        let class = ClassModel::create(db, "COS110", "Programming", teacher.id, 50, auto_enroll)
            .await
            .unwrap();
        EnrollModel::enroll(db, class.id, student.id, EnrollmentSource::Admin)
            .await
            .unwrap();

        let session = SessionModel::create(
            db,
            class.id,
            teacher.id,
            "Practical 3",
            Utc::now().date_naive(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            None,
            Some("Lab 2"),
        )
        .await
        .unwrap();
        let session = session.rotate_qr_token(db).await.unwrap();
        let token = session.qr_token.clone().unwrap();

        TestCtx {
            admin,
            teacher,
            student,
            class,
            session,
            token,
        }
    }

    fn checkin_req(auth_token: &str, qr_token: &str, identifier: &str) -> Request<Body> {
        let body = serde_json::json!({
            "qr_token": qr_token,
            "student_identifier": identifier,
        });
        Request::builder()
            .method("POST")
            .uri("/api/attendance/checkin")
            .header("Authorization", format!("Bearer {auth_token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_checkin_marks_student_present() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let (auth, _) = generate_jwt(ctx.student.id, false);
        let resp = app
            .oneshot(checkin_req(&auth, &ctx.token, "u22000001"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["session_id"], ctx.session.id);
        assert_eq!(json["data"]["student_id"], ctx.student.id);
        assert_eq!(json["data"]["status"], "present");
        assert_eq!(json["data"]["created"], true);
        assert!(json["data"]["check_in_time"].is_string());
    }

    #[tokio::test]
    async fn test_checkin_duplicate_scan_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let (auth, _) = generate_jwt(ctx.student.id, false);
        let resp = app
            .clone()
            .oneshot(checkin_req(&auth, &ctx.token, "u22000001"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .oneshot(checkin_req(&auth, &ctx.token, "u22000001"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .contains("already recorded")
        );
    }

    #[tokio::test]
    async fn test_checkin_invalid_token_not_found() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let (auth, _) = generate_jwt(ctx.student.id, false);
        let resp = app
            .oneshot(checkin_req(&auth, "ffffffffffffffffffffffffffffffff", "u22000001"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_checkin_rotated_token_invalidates_old_one() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        // rotate once more; the token in ctx is now stale
        let fresh = ctx.session.clone().rotate_qr_token(state.db()).await.unwrap();
        assert_ne!(fresh.qr_token.as_deref(), Some(ctx.token.as_str()));

        let (auth, _) = generate_jwt(ctx.student.id, false);
        let resp = app
            .oneshot(checkin_req(&auth, &ctx.token, "u22000001"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_checkin_past_deadline_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        // still active, but scheduled to have ended yesterday
        let session = SessionModel::create(
            state.db(),
            ctx.class.id,
            ctx.teacher.id,
            "Yesterday",
            (Utc::now() - Duration::days(1)).date_naive(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            Some(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
            None,
        )
        .await
        .unwrap();
        let session = session.rotate_qr_token(state.db()).await.unwrap();

        let (auth, _) = generate_jwt(ctx.student.id, false);
        let resp = app
            .oneshot(checkin_req(
                &auth,
                session.qr_token.as_deref().unwrap(),
                "u22000001",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["message"].as_str().unwrap().contains("ended"));
    }

    #[tokio::test]
    async fn test_checkin_unenrolled_student_rejected() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let outsider = UserModel::create(
            state.db(),
            "u22000999",
            "outsider@test.com",
            "password",
            false,
        )
        .await
        .unwrap();

        let (auth, _) = generate_jwt(outsider.id, false);
        let resp = app
            .oneshot(checkin_req(&auth, &ctx.token, "u22000999"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["message"].as_str().unwrap().contains("not enrolled"));
    }

    #[tokio::test]
    async fn test_checkin_auto_enrolls_when_class_allows_qr() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), true).await;

        let outsider = UserModel::create(
            state.db(),
            "u22000999",
            "outsider@test.com",
            "password",
            false,
        )
        .await
        .unwrap();

        let (auth, _) = generate_jwt(outsider.id, false);
        let resp = app
            .oneshot(checkin_req(&auth, &ctx.token, "outsider@test.com"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        // the scan created exactly one enrollment edge, tagged as QR-sourced
        let edges = EnrollEntity::find()
            .filter(EnrollCol::ClassId.eq(ctx.class.id))
            .filter(EnrollCol::StudentId.eq(outsider.id))
            .all(state.db())
            .await
            .unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, EnrollmentSource::Qr);
        assert!(edges[0].is_active);
    }

    #[tokio::test]
    async fn test_checkin_requires_auth() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let body = serde_json::json!({
            "qr_token": ctx.token,
            "student_identifier": "u22000001",
        });
        let req = Request::builder()
            .method("POST")
            .uri("/api/attendance/checkin")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // ---------------------------
    // global statistics
    // ---------------------------

    #[tokio::test]
    async fn test_statistics_admin_only() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let (auth, _) = generate_jwt(ctx.student.id, false);
        let req = Request::builder()
            .method("GET")
            .uri("/api/attendance/statistics")
            .header("Authorization", format!("Bearer {auth}"))
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_statistics_counts_across_sessions() {
        let (app, state) = make_test_app().await;
        let ctx = setup(state.db(), false).await;

        let other = UserModel::create(state.db(), "u22000002", "stu2@test.com", "password", false)
            .await
            .unwrap();
        EnrollModel::enroll(state.db(), ctx.class.id, other.id, EnrollmentSource::Admin)
            .await
            .unwrap();

        RecordModel::upsert(
            state.db(),
            ctx.session.id,
            ctx.student.id,
            AttendanceWrite {
                status: AttendanceStatus::Present,
                check_in_time: Some(Utc::now()),
                notes: None,
            },
        )
        .await
        .unwrap();
        RecordModel::upsert(
            state.db(),
            ctx.session.id,
            other.id,
            AttendanceWrite {
                status: AttendanceStatus::Absent,
                check_in_time: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let (auth, _) = generate_jwt(ctx.admin.id, true);
        let req = Request::builder()
            .method("GET")
            .uri("/api/attendance/statistics")
            .header("Authorization", format!("Bearer {auth}"))
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["data"]["total_records"], 2);
        assert_eq!(json["data"]["present_count"], 1);
        assert_eq!(json["data"]["rate"], 50.0);
    }
}
