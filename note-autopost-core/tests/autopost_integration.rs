use note_autopost_core::autopost::autopost;
use note_autopost_core::config::{AutopostConfig, BrowserConfig, GenerationConfig, PlatformConfig};
use note_autopost_core::contract::{
    AccountCredentials, MockContentGenerator, MockPublisher, MockSessionAcquirer, PublishStatus,
    RemoteArticle, SessionCredentials,
};
use note_autopost_core::error::{AuthenticationError, AutopostError, GenerationError, PublishError};
use note_autopost_core::generate::FALLBACK_TITLE;
use note_autopost_core::render::RenderOptions;
use note_autopost_core::session::StaticSessionAcquirer;

fn test_config(status: PublishStatus) -> AutopostConfig {
    AutopostConfig {
        account: AccountCredentials {
            email: "writer@example.com".to_string(),
            password: "hunter2".to_string(),
        },
        generation: GenerationConfig::new("test-key"),
        browser: BrowserConfig::default(),
        platform: PlatformConfig::default(),
        publish_status: status,
        render: RenderOptions::default(),
    }
}

fn canned_session() -> SessionCredentials {
    SessionCredentials::from_cookies(
        vec![("XSRF-TOKEN".to_string(), "tok".to_string())],
        "XSRF-TOKEN",
    )
}

fn generator_returning(text: &'static str) -> MockContentGenerator {
    let mut generator = MockContentGenerator::new();
    generator
        .expect_complete()
        .times(1)
        .returning(move |_| Ok(text.to_string()));
    generator
}

#[tokio::test]
async fn full_run_creates_and_saves_article() {
    let config = test_config(PublishStatus::Draft);
    let generator = generator_returning("My Title\nline one\n\nline two");
    let acquirer = StaticSessionAcquirer::new(canned_session());

    let mut publisher = MockPublisher::new();
    publisher
        .expect_create_draft()
        .withf(|session, title, html| {
            session.xsrf_token == "tok"
                && title == "My Title"
                && html == "<p>line one</p>\n<p>line two</p>"
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(RemoteArticle {
                id: "1".to_string(),
                key: "abc".to_string(),
            })
        });
    publisher
        .expect_set_status()
        .withf(|_, id, title, _, status| {
            id == "1" && title == "My Title" && *status == PublishStatus::Draft
        })
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let report = autopost(&config, &generator, &acquirer, &publisher)
        .await
        .expect("run succeeds");

    assert_eq!(report.article.key, "abc");
    assert_eq!(report.title, "My Title");
    assert_eq!(report.status, PublishStatus::Draft);
    assert_eq!(report.url, "https://note.com/any/n/abc");
}

#[tokio::test]
async fn generation_failure_still_posts_placeholder() {
    let config = test_config(PublishStatus::Public);
    let mut generator = MockContentGenerator::new();
    generator
        .expect_complete()
        .returning(|_| Err(GenerationError::EmptyResponse));
    let acquirer = StaticSessionAcquirer::new(canned_session());

    let mut publisher = MockPublisher::new();
    publisher
        .expect_create_draft()
        .withf(|_, title, html| title == FALLBACK_TITLE && html == "<p>これはテスト投稿です。</p>")
        .times(1)
        .returning(|_, _, _| {
            Ok(RemoteArticle {
                id: "5".to_string(),
                key: "n5".to_string(),
            })
        });
    publisher
        .expect_set_status()
        .withf(|_, _, _, _, status| *status == PublishStatus::Public)
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let report = autopost(&config, &generator, &acquirer, &publisher)
        .await
        .expect("run succeeds with placeholder content");
    assert_eq!(report.title, FALLBACK_TITLE);
}

#[tokio::test]
async fn login_failure_aborts_before_publishing() {
    let config = test_config(PublishStatus::Draft);
    let generator = generator_returning("T\nbody");

    let mut acquirer = MockSessionAcquirer::new();
    acquirer
        .expect_acquire()
        .withf(|account| account.email == "writer@example.com")
        .times(1)
        .returning(|_| {
            Err(AuthenticationError::ElementNotFound {
                field: "email",
                tried: "input[name=\"email\"]".to_string(),
            })
        });

    let mut publisher = MockPublisher::new();
    publisher.expect_create_draft().never();
    publisher.expect_set_status().never();

    let err = autopost(&config, &generator, &acquirer, &publisher)
        .await
        .unwrap_err();
    assert!(matches!(err, AutopostError::Authentication(_)));
}

#[tokio::test]
async fn rejected_credentials_abort_as_authentication_error() {
    let config = test_config(PublishStatus::Public);
    let generator = generator_returning("T\nbody");

    let mut acquirer = MockSessionAcquirer::new();
    acquirer.expect_acquire().times(1).returning(|_| {
        Err(AuthenticationError::Rejected {
            url: "https://note.com/login".to_string(),
        })
    });

    let mut publisher = MockPublisher::new();
    publisher.expect_create_draft().never();
    publisher.expect_set_status().never();

    let err = autopost(&config, &generator, &acquirer, &publisher)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutopostError::Authentication(AuthenticationError::Rejected { .. })
    ));
    assert!(err.to_string().contains("not accepted"), "got {err}");
}

#[tokio::test]
async fn create_failure_skips_status_update() {
    let config = test_config(PublishStatus::Draft);
    let generator = generator_returning("T\nbody");
    let acquirer = StaticSessionAcquirer::new(canned_session());

    let mut publisher = MockPublisher::new();
    publisher
        .expect_create_draft()
        .times(1)
        .returning(|_, _, _| {
            Err(PublishError::Status {
                status: 403,
                body: "forbidden".to_string(),
            })
        });
    publisher.expect_set_status().never();

    let err = autopost(&config, &generator, &acquirer, &publisher)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutopostError::CreateDraft(PublishError::Status { status: 403, .. })
    ));
}

#[tokio::test]
async fn status_failure_reports_orphaned_draft() {
    let config = test_config(PublishStatus::Public);
    let generator = generator_returning("T\nbody");
    let acquirer = StaticSessionAcquirer::new(canned_session());

    let mut publisher = MockPublisher::new();
    publisher.expect_create_draft().returning(|_, _, _| {
        Ok(RemoteArticle {
            id: "77".to_string(),
            key: "orphan".to_string(),
        })
    });
    publisher
        .expect_set_status()
        .times(1)
        .returning(|_, _, _, _, _| {
            Err(PublishError::Status {
                status: 500,
                body: String::new(),
            })
        });

    match autopost(&config, &generator, &acquirer, &publisher).await {
        Err(AutopostError::SetStatus { article, .. }) => {
            assert_eq!(article.id, "77");
            assert_eq!(article.key, "orphan");
        }
        other => panic!("expected SetStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn render_options_flow_into_published_html() {
    let mut config = test_config(PublishStatus::Draft);
    config.render.h1 = false;
    let generator = generator_returning("Title\n# not a heading\n\n- item");
    let acquirer = StaticSessionAcquirer::new(canned_session());

    let mut publisher = MockPublisher::new();
    publisher
        .expect_create_draft()
        .withf(|_, _, html| html == "<p># not a heading</p>\n<li>item</li>")
        .returning(|_, _, _| {
            Ok(RemoteArticle {
                id: "1".to_string(),
                key: "k".to_string(),
            })
        });
    publisher
        .expect_set_status()
        .returning(|_, _, _, _, _| Ok(()));

    autopost(&config, &generator, &acquirer, &publisher)
        .await
        .expect("run succeeds");
}
