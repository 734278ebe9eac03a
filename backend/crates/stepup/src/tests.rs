//! Unit tests for the step-up crate
//!
//! Use-case tests run against the in-memory backend, which honors the
//! same atomicity contracts as the PostgreSQL implementation.

mod support {
    use crate::application::complete_challenge::CompleteChallengeUseCase;
    use crate::application::config::StepUpConfig;
    use crate::application::issue_challenge::IssueChallengeUseCase;
    use crate::domain::repository::{CodeDelivery, DeliveryError};
    use crate::domain::value_objects::ChallengeCode;
    use crate::infra::memory::InMemoryStepUpRepository;
    use kernel::id::SubjectId;
    use std::sync::{Arc, Mutex};

    /// Captures every code handed to delivery
    #[derive(Clone, Default)]
    pub struct RecordingDelivery {
        pub sent: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingDelivery {
        pub fn last_code(&self) -> String {
            self.sent.lock().unwrap().last().cloned().expect("no code sent")
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl CodeDelivery for RecordingDelivery {
        async fn send(
            &self,
            _subject_id: &SubjectId,
            code: &ChallengeCode,
        ) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(code.as_str().to_string());
            Ok(())
        }
    }

    /// Always reports a transport failure
    #[derive(Clone, Copy, Default)]
    pub struct FailingDelivery;

    impl CodeDelivery for FailingDelivery {
        async fn send(
            &self,
            _subject_id: &SubjectId,
            _code: &ChallengeCode,
        ) -> Result<(), DeliveryError> {
            Err(DeliveryError("smtp unreachable".to_string()))
        }
    }

    pub fn issue_use_case<D: CodeDelivery>(
        repo: &Arc<InMemoryStepUpRepository>,
        delivery: D,
        config: &Arc<StepUpConfig>,
    ) -> IssueChallengeUseCase<InMemoryStepUpRepository, InMemoryStepUpRepository, D> {
        IssueChallengeUseCase::new(
            repo.clone(),
            repo.clone(),
            Arc::new(delivery),
            config.clone(),
        )
    }

    pub fn complete_use_case(
        repo: &Arc<InMemoryStepUpRepository>,
        config: &Arc<StepUpConfig>,
    ) -> CompleteChallengeUseCase<InMemoryStepUpRepository> {
        CompleteChallengeUseCase::new(repo.clone(), config.clone())
    }
}

mod config_tests {
    use crate::application::config::StepUpConfig;
    use crate::domain::value_objects::RateLimitAction;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = StepUpConfig::default();

        assert_eq!(config.code_len, 6);
        assert_eq!(config.challenge_ttl, Duration::from_secs(600));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.issue_rate_limit.max_requests, 5);
        assert_eq!(config.issue_rate_limit.window, Duration::from_secs(900));
        assert_eq!(config.session_cookie_name, "admin_session");
        assert_eq!(config.challenge_ttl_ms(), 600_000);
    }

    #[test]
    fn test_with_random_secret() {
        let config1 = StepUpConfig::with_random_secret();
        let config2 = StepUpConfig::with_random_secret();

        assert_ne!(config1.session_secret, config2.session_secret);
        assert!(config1.session_secret.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_rate_limit_lookup() {
        let config = StepUpConfig::default();
        let limit = config.rate_limit(RateLimitAction::IssueCode);
        assert_eq!(limit.max_requests, 5);
    }
}

mod domain_tests {
    use crate::domain::entities::Challenge;
    use crate::domain::value_objects::{ChallengeCode, Purpose, RateLimitAction};
    use kernel::id::SubjectId;

    #[test]
    fn test_challenge_creation() {
        let subject_id = SubjectId::new();
        let code = ChallengeCode::generate(6);
        let challenge = Challenge::new(subject_id, Purpose::LoginVerify, code, 600_000, 5);

        assert_eq!(challenge.subject_id, subject_id);
        assert_eq!(challenge.attempts_remaining, 5);
        assert!(!challenge.consumed);
        assert!(!challenge.is_expired());
        assert_eq!(
            challenge.expires_at_ms,
            challenge.issued_at.timestamp_millis() + 600_000
        );
    }

    #[test]
    fn test_challenge_negative_ttl_is_expired() {
        let challenge = Challenge::new(
            SubjectId::new(),
            Purpose::LoginVerify,
            ChallengeCode::generate(6),
            -1,
            5,
        );
        assert!(challenge.is_expired());
    }

    #[test]
    fn test_code_generation_shape() {
        let code = ChallengeCode::generate(6);
        assert_eq!(code.as_str().len(), 6);
        assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn test_code_well_formed() {
        assert!(ChallengeCode::is_well_formed("123456", 6));
        assert!(!ChallengeCode::is_well_formed("12345", 6));
        assert!(!ChallengeCode::is_well_formed("1234567", 6));
        assert!(!ChallengeCode::is_well_formed("12345a", 6));
        assert!(!ChallengeCode::is_well_formed("", 6));
    }

    #[test]
    fn test_code_matches_itself_only() {
        let code = ChallengeCode::generate(6);
        assert!(code.matches(code.as_str()));
        assert!(!code.matches("000000") || code.as_str() == "000000");
        assert!(!code.matches("12345"));
    }

    #[test]
    fn test_code_debug_redacted() {
        let code = ChallengeCode::generate(6);
        let debug = format!("{:?}", code);
        assert!(!debug.contains(code.as_str()));
        assert!(debug.contains("****"));
    }

    #[test]
    fn test_purpose_roundtrip() {
        let purpose: Purpose = "login-verify".parse().unwrap();
        assert_eq!(purpose, Purpose::LoginVerify);
        assert_eq!(purpose.as_str(), "login-verify");
        assert!("password-reset".parse::<Purpose>().is_err());
    }

    #[test]
    fn test_rate_limit_action_name() {
        assert_eq!(RateLimitAction::IssueCode.as_str(), "otp");
    }
}

mod error_tests {
    use crate::error::StepUpError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::time::Duration;

    #[test]
    fn test_error_status_codes() {
        let test_cases: Vec<(StepUpError, StatusCode)> = vec![
            (
                StepUpError::RateLimited {
                    retry_after: Duration::from_secs(60),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (StepUpError::ChallengeNotFound, StatusCode::GONE),
            (StepUpError::ChallengeExpired, StatusCode::GONE),
            (StepUpError::AttemptsExhausted, StatusCode::GONE),
            (StepUpError::AlreadyUsed, StatusCode::CONFLICT),
            (
                StepUpError::CodeMismatch {
                    attempts_remaining: 3,
                },
                StatusCode::CONFLICT,
            ),
            (
                StepUpError::Internal("test".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(
                response.status(),
                expected_status,
                "Error should return correct status code"
            );
        }
    }

    #[test]
    fn test_rate_limited_sets_retry_after_header() {
        let response = StepUpError::RateLimited {
            retry_after: Duration::from_secs(120),
        }
        .into_response();

        assert_eq!(
            response.headers().get("retry-after").unwrap(),
            "120"
        );
    }

    #[test]
    fn test_user_wording_leaks_nothing() {
        // Wrong code, exhaustion, rate limiting and missing challenges
        // must be indistinguishable to the user
        let mismatch = StepUpError::CodeMismatch {
            attempts_remaining: 2,
        }
        .user_message();
        assert_eq!(StepUpError::AttemptsExhausted.user_message(), mismatch);
        assert_eq!(StepUpError::ChallengeNotFound.user_message(), mismatch);
        assert_eq!(
            StepUpError::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .user_message(),
            mismatch
        );
    }

    #[test]
    fn test_internal_kinds_stay_distinct() {
        assert!(StepUpError::AttemptsExhausted.to_string().contains("exhausted"));
        assert!(
            StepUpError::CodeMismatch {
                attempts_remaining: 2
            }
            .to_string()
            .contains("mismatch")
        );
        assert!(
            StepUpError::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .to_string()
            .contains("Rate limit")
        );
    }
}

mod dto_tests {
    use crate::presentation::dto::*;

    #[test]
    fn test_request_challenge_response_serialization() {
        let response = RequestChallengeResponse {
            success: true,
            message: "Code sent successfully".to_string(),
            expires_at_ms: 1234567890000,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""success":true"#));
        assert!(json.contains("expiresAtMs"));
    }

    #[test]
    fn test_submit_code_request_deserialization() {
        let json = r#"{"code":"123456"}"#;
        let request: SubmitCodeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.code, "123456");
    }

    #[test]
    fn test_revoke_sessions_response_serialization() {
        let response = RevokeSessionsResponse {
            success: true,
            message: "Signed out on all devices".to_string(),
            revoked: 3,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""revoked":3"#));
    }
}

mod issue_tests {
    use super::support::*;
    use crate::application::config::StepUpConfig;
    use crate::domain::repository::ChallengeRepository;
    use crate::domain::value_objects::Purpose;
    use crate::error::StepUpError;
    use crate::infra::memory::InMemoryStepUpRepository;
    use kernel::id::SubjectId;
    use platform::rate_limit::RateLimitConfig;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_issue_then_complete_round_trip() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery.clone(), &config);
        let output = issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        assert!(output.delivered);

        let code = delivery.last_code();
        assert_eq!(code.len(), 6);

        let complete = complete_use_case(&repo, &config);
        complete
            .execute(subject_id, Purpose::LoginVerify, &code)
            .await
            .unwrap();

        // Replaying the same code can never verify twice
        let replay = complete
            .execute(subject_id, Purpose::LoginVerify, &code)
            .await;
        assert!(matches!(replay, Err(StepUpError::AlreadyUsed)));
    }

    #[tokio::test]
    async fn test_rate_limit_denies_excess_issuance() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig {
            issue_rate_limit: RateLimitConfig::new(2, 900),
            ..StepUpConfig::default()
        });
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery.clone(), &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();

        let denied = issue.execute(subject_id, Purpose::LoginVerify).await;
        match denied {
            Err(StepUpError::RateLimited { retry_after }) => {
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("expected RateLimited, got {:?}", other.map(|_| ())),
        }

        // A denied issuance creates nothing and sends nothing
        assert_eq!(delivery.sent_count(), 2);

        // Other subjects are unaffected
        let other_subject = SubjectId::new();
        issue
            .execute(other_subject, Purpose::LoginVerify)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reissue_supersedes_old_code() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery.clone(), &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        let old_code = delivery.last_code();

        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        let new_code = delivery.last_code();
        assert_ne!(old_code, new_code);

        let complete = complete_use_case(&repo, &config);
        let stale = complete
            .execute(subject_id, Purpose::LoginVerify, &old_code)
            .await;
        assert!(matches!(stale, Err(StepUpError::CodeMismatch { .. })));

        complete
            .execute(subject_id, Purpose::LoginVerify, &new_code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_challenge_active() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, FailingDelivery, &config);
        let output = issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        assert!(!output.delivered);

        // The stored code still verifies (redelivery path)
        let challenge = repo
            .find(&subject_id, Purpose::LoginVerify)
            .await
            .unwrap()
            .expect("challenge should remain active");

        let complete = complete_use_case(&repo, &config);
        complete
            .execute(subject_id, Purpose::LoginVerify, challenge.code.as_str())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_window_resets_after_elapse() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig {
            issue_rate_limit: RateLimitConfig {
                max_requests: 1,
                window: Duration::from_millis(50),
            },
            ..StepUpConfig::default()
        });
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery, &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        assert!(matches!(
            issue.execute(subject_id, Purpose::LoginVerify).await,
            Err(StepUpError::RateLimited { .. })
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;

        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
    }
}

mod complete_tests {
    use super::support::*;
    use crate::application::config::StepUpConfig;
    use crate::domain::entities::Challenge;
    use crate::domain::repository::ChallengeRepository;
    use crate::domain::value_objects::{ChallengeCode, Purpose};
    use crate::error::StepUpError;
    use crate::infra::memory::InMemoryStepUpRepository;
    use kernel::id::SubjectId;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_complete_without_challenge_not_found() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());

        let complete = complete_use_case(&repo, &config);
        let result = complete
            .execute(SubjectId::new(), Purpose::LoginVerify, "123456")
            .await;
        assert!(matches!(result, Err(StepUpError::ChallengeNotFound)));
    }

    #[tokio::test]
    async fn test_expired_challenge_reclaimed_lazily() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let subject_id = SubjectId::new();

        let code = ChallengeCode::generate(6);
        let submitted = code.as_str().to_string();
        let expired = Challenge::new(subject_id, Purpose::LoginVerify, code, -1, 5);
        repo.put(&expired).await.unwrap();

        let complete = complete_use_case(&repo, &config);

        // Correct code, but too late
        let result = complete
            .execute(subject_id, Purpose::LoginVerify, &submitted)
            .await;
        assert!(matches!(result, Err(StepUpError::ChallengeExpired)));

        // The expired record was swept; a second try observes nothing
        let result = complete
            .execute(subject_id, Purpose::LoginVerify, &submitted)
            .await;
        assert!(matches!(result, Err(StepUpError::ChallengeNotFound)));
    }

    #[tokio::test]
    async fn test_attempts_exhaust_and_invalidate() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig {
            max_attempts: 3,
            ..StepUpConfig::default()
        });
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery.clone(), &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        let good_code = delivery.last_code();
        let bad_code = if good_code == "000000" { "000001" } else { "000000" };

        let complete = complete_use_case(&repo, &config);

        for expected_remaining in [2, 1] {
            let result = complete
                .execute(subject_id, Purpose::LoginVerify, bad_code)
                .await;
            match result {
                Err(StepUpError::CodeMismatch { attempts_remaining }) => {
                    assert_eq!(attempts_remaining, expected_remaining);
                }
                other => panic!("expected CodeMismatch, got {:?}", other.map(|_| ())),
            }
        }

        // Final allowed attempt reports exhaustion, not another mismatch
        let result = complete
            .execute(subject_id, Purpose::LoginVerify, bad_code)
            .await;
        assert!(matches!(result, Err(StepUpError::AttemptsExhausted)));

        // Even the correct code is dead now
        let result = complete
            .execute(subject_id, Purpose::LoginVerify, &good_code)
            .await;
        assert!(matches!(result, Err(StepUpError::ChallengeNotFound)));
    }

    #[tokio::test]
    async fn test_malformed_code_charged_as_attempt() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery, &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();

        let complete = complete_use_case(&repo, &config);
        let result = complete
            .execute(subject_id, Purpose::LoginVerify, "not-a-code")
            .await;
        match result {
            Err(StepUpError::CodeMismatch { attempts_remaining }) => {
                assert_eq!(attempts_remaining, 4);
            }
            other => panic!("expected CodeMismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_wrong_then_right_still_verifies() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery.clone(), &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        let good_code = delivery.last_code();
        let bad_code = if good_code == "999999" { "999998" } else { "999999" };

        let complete = complete_use_case(&repo, &config);
        assert!(
            complete
                .execute(subject_id, Purpose::LoginVerify, bad_code)
                .await
                .is_err()
        );
        complete
            .execute(subject_id, Purpose::LoginVerify, &good_code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_completion_verifies_exactly_once() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let config = Arc::new(StepUpConfig::default());
        let delivery = RecordingDelivery::default();
        let subject_id = SubjectId::new();

        let issue = issue_use_case(&repo, delivery.clone(), &config);
        issue.execute(subject_id, Purpose::LoginVerify).await.unwrap();
        let code = delivery.last_code();

        let complete = Arc::new(complete_use_case(&repo, &config));

        let a = {
            let complete = complete.clone();
            let code = code.clone();
            tokio::spawn(async move {
                complete.execute(subject_id, Purpose::LoginVerify, &code).await
            })
        };
        let b = {
            let complete = complete.clone();
            let code = code.clone();
            tokio::spawn(async move {
                complete.execute(subject_id, Purpose::LoginVerify, &code).await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];

        let verified = results.iter().filter(|r| r.is_ok()).count();
        let already_used = results
            .iter()
            .filter(|r| matches!(r, Err(StepUpError::AlreadyUsed)))
            .count();

        assert_eq!(verified, 1, "exactly one completion may verify");
        assert_eq!(already_used, 1, "the loser must observe AlreadyUsed");
    }
}

mod revoke_tests {
    use crate::application::revoke_sessions::RevokeSessionsUseCase;
    use crate::infra::memory::InMemoryStepUpRepository;
    use kernel::id::{SessionId, SubjectId};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_revoke_all_is_total() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let subject_id = SubjectId::new();
        let other_subject = SubjectId::new();

        for _ in 0..3 {
            repo.insert_session(SessionId::new(), &subject_id);
        }
        repo.insert_session(SessionId::new(), &other_subject);

        let revoke = RevokeSessionsUseCase::new(repo.clone());
        let revoked = revoke.execute(subject_id).await.unwrap();

        assert_eq!(revoked, 3);
        assert_eq!(repo.session_count(&subject_id), 0);
        // Other subjects keep their sessions
        assert_eq!(repo.session_count(&other_subject), 1);
    }

    #[tokio::test]
    async fn test_revoke_with_no_sessions() {
        let repo = Arc::new(InMemoryStepUpRepository::new());
        let revoke = RevokeSessionsUseCase::new(repo.clone());
        let revoked = revoke.execute(SubjectId::new()).await.unwrap();
        assert_eq!(revoked, 0);
    }
}
