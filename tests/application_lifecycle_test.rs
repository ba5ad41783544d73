use std::sync::Arc;

use commission_market::{
    dto::{
        application_dto::{
            ApplicationListQuery, ConvertApplicationPayload, CreateApplicationPayload,
            UpdateApplicationStatusPayload,
        },
        post_dto::{CreateAvailabilityPostPayload, CreateJobPostPayload, UpdatePostPayload},
        profile_dto::{RegisterArtistPayload, RegisterClientPayload},
        project_dto::{CreateProjectPayload, UpdateProjectPayload},
    },
    error::Error,
    models::{
        application::{Application, ApplicationStatus, ApplicationType},
        notification::NotificationType,
        post::{AvailabilityStatus, Category, JobStatus, Post, PostRef},
        profile::{Identity, Role},
        project::ProjectStatus,
    },
    store::{MemoryStore, PageRequest},
    AppState,
};
use rust_decimal::Decimal;
use uuid::Uuid;

struct Party {
    identity: Identity,
    profile_id: Uuid,
}

async fn market() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), "test_secret_key")
}

async fn client(state: &AppState) -> Party {
    let identity = Identity {
        user_id: Uuid::new_v4(),
        role: Role::Client,
    };
    let profile = state
        .profile_service
        .register_client(
            &identity,
            RegisterClientPayload {
                company_name: Some("Studio".into()),
            },
        )
        .await
        .expect("register client");
    Party {
        identity,
        profile_id: profile.id,
    }
}

async fn artist(state: &AppState, name: &str) -> Party {
    let identity = Identity {
        user_id: Uuid::new_v4(),
        role: Role::Artist,
    };
    let profile = state
        .profile_service
        .register_artist(
            &identity,
            RegisterArtistPayload {
                display_name: name.into(),
            },
        )
        .await
        .expect("register artist");
    Party {
        identity,
        profile_id: profile.id,
    }
}

async fn job(state: &AppState, owner: &Party, title: &str) -> Uuid {
    state
        .post_service
        .create_job(
            &owner.identity,
            CreateJobPostPayload {
                title: title.into(),
                description: "Cover art for a novel".into(),
                category: Category::Illustration,
                budget: Decimal::new(500, 0),
                deadline: None,
            },
        )
        .await
        .expect("create job")
        .id
}

fn job_application(job_post_id: Uuid) -> CreateApplicationPayload {
    CreateApplicationPayload {
        application_type: ApplicationType::ArtistToJob,
        job_post_id: Some(job_post_id),
        availability_post_id: None,
        artist_id: None,
        client_id: None,
        message: "I would love to work on this".into(),
        proposed_budget: Some(Decimal::new(450, 0)),
        proposed_deadline: None,
    }
}

async fn apply(state: &AppState, artist: &Party, job_post_id: Uuid) -> Application {
    state
        .application_service
        .create(&artist.identity, job_application(job_post_id))
        .await
        .expect("apply")
}

fn project_payload(title: &str, job_post_id: Option<Uuid>) -> CreateProjectPayload {
    CreateProjectPayload {
        title: title.into(),
        description: "Front and back".into(),
        budget: Decimal::new(500, 0),
        deadline: None,
        job_post_id,
    }
}

fn status(value: &str) -> UpdateApplicationStatusPayload {
    UpdateApplicationStatusPayload {
        status: value.into(),
        message: None,
    }
}

async fn inbox(state: &AppState, party: &Party) -> Vec<NotificationType> {
    state
        .notification_service
        .list(party.identity.user_id, false, PageRequest::new(Some(1), Some(100)))
        .await
        .expect("inbox")
        .items
        .into_iter()
        .map(|n| n.notification_type)
        .collect()
}

#[tokio::test]
async fn accepting_one_application_rejects_the_rest_and_assigns_the_project() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let a2 = artist(&state, "Grace").await;
    let job_id = job(&state, &owner, "Book Cover").await;

    let project = state
        .project_service
        .create(
            &owner.identity,
            CreateProjectPayload {
                title: "Book Cover".into(),
                description: "Front and back".into(),
                budget: Decimal::new(500, 0),
                deadline: None,
                job_post_id: Some(job_id),
            },
        )
        .await
        .unwrap();
    assert_eq!(project.status, ProjectStatus::Open);

    let first = apply(&state, &a1, job_id).await;
    let second = apply(&state, &a2, job_id).await;
    assert_eq!(first.status, ApplicationStatus::Pending);
    assert_eq!(second.status, ApplicationStatus::Pending);

    let accepted = state
        .application_service
        .update_status(&owner.identity, first.id, status("accepted"))
        .await
        .unwrap();
    assert_eq!(accepted.status, ApplicationStatus::Accepted);

    let sibling = state
        .application_service
        .get(&owner.identity, second.id)
        .await
        .unwrap();
    assert_eq!(sibling.status, ApplicationStatus::Rejected);

    let project = state
        .project_service
        .get(&owner.identity, project.id)
        .await
        .unwrap();
    assert_eq!(project.artist_id, Some(a1.profile_id));
    assert_eq!(project.status, ProjectStatus::InProgress);

    match state.post_service.get(PostRef::Job(job_id)).await.unwrap() {
        Post::Job(post) => assert_eq!(post.application_count, 2),
        other => panic!("unexpected post {:?}", other),
    }

    let a1_inbox = inbox(&state, &a1).await;
    assert!(a1_inbox.contains(&NotificationType::ApplicationAccepted));
    assert!(a1_inbox.contains(&NotificationType::ProjectAssigned));
    assert_eq!(inbox(&state, &a2).await, vec![NotificationType::ApplicationRejected]);
    assert_eq!(
        inbox(&state, &owner).await,
        vec![
            NotificationType::ApplicationReceived,
            NotificationType::ApplicationReceived
        ]
    );
}

#[tokio::test]
async fn converting_an_accepted_job_application_creates_the_project() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Book Cover").await;
    let application = apply(&state, &a1, job_id).await;

    state
        .application_service
        .update_status(&owner.identity, application.id, status("accepted"))
        .await
        .unwrap();

    let project = state
        .conversion_service
        .convert(
            &owner.identity,
            application.id,
            ConvertApplicationPayload {
                title: Some("Custom Title".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(project.title, "Custom Title");
    assert_eq!(project.slug, "custom-title");
    assert_eq!(project.artist_id, Some(a1.profile_id));
    assert_eq!(project.client_id, owner.profile_id);
    assert_eq!(project.application_id, Some(application.id));
    assert_eq!(project.budget, Decimal::new(500, 0));
    assert_eq!(project.status, ProjectStatus::InProgress);

    let converted = state
        .application_service
        .get(&a1.identity, application.id)
        .await
        .unwrap();
    assert_eq!(converted.status, ApplicationStatus::ConvertedToProject);
    assert_eq!(converted.project_id, Some(project.id));

    match state.post_service.get(PostRef::Job(job_id)).await.unwrap() {
        Post::Job(post) => assert_eq!(post.status, JobStatus::InProgress),
        other => panic!("unexpected post {:?}", other),
    }

    assert!(inbox(&state, &a1).await.contains(&NotificationType::ProjectCreated));
    assert!(inbox(&state, &owner).await.contains(&NotificationType::ProjectCreated));
}

#[tokio::test]
async fn converting_adopts_the_project_opened_for_the_job() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Book Cover").await;
    let opened = state
        .project_service
        .create(
            &owner.identity,
            CreateProjectPayload {
                title: "Book Cover".into(),
                description: "Front and back".into(),
                budget: Decimal::new(500, 0),
                deadline: None,
                job_post_id: Some(job_id),
            },
        )
        .await
        .unwrap();
    let application = apply(&state, &a1, job_id).await;
    state
        .application_service
        .update_status(&owner.identity, application.id, status("accepted"))
        .await
        .unwrap();

    let project = state
        .conversion_service
        .convert(&a1.identity, application.id, ConvertApplicationPayload::default())
        .await
        .unwrap();
    assert_eq!(project.id, opened.id);
    assert_eq!(project.slug, opened.slug);
    assert_eq!(project.application_id, Some(application.id));

    let listed = state
        .project_service
        .list(&owner.identity, Default::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn service_offers_close_the_availability_post_on_conversion() {
    let state = market().await;
    let owner = client(&state).await;
    let seller = artist(&state, "Ada").await;
    let post = state
        .post_service
        .create_availability(
            &seller.identity,
            CreateAvailabilityPostPayload {
                title: "Portrait commissions".into(),
                description: "Painted portraits".into(),
                category: Category::Illustration,
                budget: Decimal::new(120, 0),
            },
        )
        .await
        .unwrap();

    let payload = CreateApplicationPayload {
        application_type: ApplicationType::ClientToService,
        job_post_id: None,
        availability_post_id: Some(post.id),
        artist_id: None,
        client_id: None,
        message: "A portrait of my cat".into(),
        proposed_budget: None,
        proposed_deadline: None,
    };
    let offer = state
        .application_service
        .create(&owner.identity, payload.clone())
        .await
        .unwrap();
    assert_eq!(offer.artist_id, seller.profile_id);
    assert_eq!(offer.client_id, owner.profile_id);

    // Repeated service offers are allowed.
    let repeat = state
        .application_service
        .create(&owner.identity, payload)
        .await
        .unwrap();
    assert_ne!(repeat.id, offer.id);

    let accepted = state
        .application_service
        .update_status(&seller.identity, offer.id, status("accepted"))
        .await
        .unwrap();
    assert_eq!(accepted.status, ApplicationStatus::Accepted);

    let project = state
        .conversion_service
        .convert(&seller.identity, offer.id, ConvertApplicationPayload::default())
        .await
        .unwrap();
    assert_eq!(project.title, "Portrait commissions");
    assert_eq!(project.job_post_id, None);

    match state.post_service.get(PostRef::Availability(post.id)).await.unwrap() {
        Post::Availability(post) => assert_eq!(post.status, AvailabilityStatus::Closed),
        other => panic!("unexpected post {:?}", other),
    }
}

#[tokio::test]
async fn repeating_a_status_update_has_no_side_effects() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let a2 = artist(&state, "Grace").await;
    let job_id = job(&state, &owner, "Logo").await;
    let first = apply(&state, &a1, job_id).await;
    apply(&state, &a2, job_id).await;

    let once = state
        .application_service
        .update_status(&owner.identity, first.id, status("accepted"))
        .await
        .unwrap();
    let twice = state
        .application_service
        .update_status(&owner.identity, first.id, status("accepted"))
        .await
        .unwrap();
    assert_eq!(once, twice);

    assert_eq!(inbox(&state, &a1).await, vec![NotificationType::ApplicationAccepted]);
    assert_eq!(inbox(&state, &a2).await, vec![NotificationType::ApplicationRejected]);
}

#[tokio::test]
async fn converted_applications_reject_every_status_update() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Logo").await;
    let application = apply(&state, &a1, job_id).await;
    state
        .application_service
        .update_status(&owner.identity, application.id, status("accepted"))
        .await
        .unwrap();
    state
        .conversion_service
        .convert(&owner.identity, application.id, ConvertApplicationPayload::default())
        .await
        .unwrap();

    for next in ["pending", "accepted", "rejected", "converted_to_project"] {
        let err = state
            .application_service
            .update_status(&owner.identity, application.id, status(next))
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::InvalidTransition { from: ApplicationStatus::ConvertedToProject, .. }),
            "{} -> {:?}",
            next,
            err
        );
    }
}

#[tokio::test]
async fn invalid_status_names_and_backward_moves_are_refused() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Logo").await;
    let application = apply(&state, &a1, job_id).await;

    let err = state
        .application_service
        .update_status(&owner.identity, application.id, status("approved"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidStatus(_)));

    state
        .application_service
        .update_status(&owner.identity, application.id, status("rejected"))
        .await
        .unwrap();
    let err = state
        .application_service
        .update_status(&owner.identity, application.id, status("pending"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: ApplicationStatus::Rejected,
            to: ApplicationStatus::Pending,
            ..
        }
    ));

    let err = state
        .application_service
        .update_status(&a1.identity, application.id, status("accepted"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn an_artist_applies_to_a_job_only_once() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Logo").await;
    apply(&state, &a1, job_id).await;

    let err = state
        .application_service
        .create(&a1.identity, job_application(job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateApplication { artist_id, .. } if artist_id == a1.profile_id));
}

#[tokio::test]
async fn applications_need_an_open_job_and_a_profile() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Logo").await;

    let missing = Uuid::new_v4();
    let err = state
        .application_service
        .create(&a1.identity, job_application(missing))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PostNotFound(PostRef::Job(id)) if id == missing));

    let stranger = Identity {
        user_id: Uuid::new_v4(),
        role: Role::Artist,
    };
    let err = state
        .application_service
        .create(&stranger, job_application(job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ActorProfileNotFound { role: Role::Artist, .. }));

    state
        .post_service
        .set_status(&owner.identity, PostRef::Job(job_id), "closed")
        .await
        .unwrap();
    let err = state
        .application_service
        .create(&a1.identity, job_application(job_id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::PostNotAcceptingApplications { status: "closed", .. }
    ));
}

#[tokio::test]
async fn conversion_requires_an_accepted_application_and_writes_nothing_otherwise() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let a2 = artist(&state, "Grace").await;
    let job_id = job(&state, &owner, "Logo").await;
    let pending = apply(&state, &a1, job_id).await;
    let rejected = apply(&state, &a2, job_id).await;
    state
        .application_service
        .update_status(&owner.identity, rejected.id, status("rejected"))
        .await
        .unwrap();

    for (id, expected) in [
        (pending.id, ApplicationStatus::Pending),
        (rejected.id, ApplicationStatus::Rejected),
    ] {
        let err = state
            .conversion_service
            .convert(&owner.identity, id, ConvertApplicationPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ApplicationNotAccepted { status, .. } if status == expected));
    }

    let projects = state
        .project_service
        .list(&owner.identity, Default::default())
        .await
        .unwrap();
    assert_eq!(projects.total, 0);
    match state.post_service.get(PostRef::Job(job_id)).await.unwrap() {
        Post::Job(post) => assert_eq!(post.status, JobStatus::Open),
        other => panic!("unexpected post {:?}", other),
    }
}

#[tokio::test]
async fn concurrent_accepts_on_one_post_have_a_single_winner() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let a2 = artist(&state, "Grace").await;
    let job_id = job(&state, &owner, "Logo").await;
    let first = apply(&state, &a1, job_id).await;
    let second = apply(&state, &a2, job_id).await;

    let (left, right) = tokio::join!(
        state
            .application_service
            .update_status(&owner.identity, first.id, status("accepted")),
        state
            .application_service
            .update_status(&owner.identity, second.id, status("accepted")),
    );
    let outcomes = [left, right];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, Error::InvalidTransition { .. })));

    let all = state
        .application_service
        .list(
            &owner.identity,
            ApplicationListQuery {
                job_post_id: Some(job_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let accepted = all
        .items
        .iter()
        .filter(|a| a.status == ApplicationStatus::Accepted)
        .count();
    let rejected = all
        .items
        .iter()
        .filter(|a| a.status == ApplicationStatus::Rejected)
        .count();
    assert_eq!((accepted, rejected), (1, 1));
}

#[tokio::test]
async fn posts_with_live_applications_cannot_be_deleted() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Logo").await;
    let application = apply(&state, &a1, job_id).await;

    let err = state
        .post_service
        .delete(&owner.identity, PostRef::Job(job_id))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ApplicationLocked(_)));

    state
        .application_service
        .update_status(&owner.identity, application.id, status("rejected"))
        .await
        .unwrap();
    state
        .post_service
        .delete(&owner.identity, PostRef::Job(job_id))
        .await
        .unwrap();
    let err = state
        .application_service
        .get(&owner.identity, application.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ApplicationNotFound(_)));
}

#[tokio::test]
async fn identical_titles_get_numbered_slugs() {
    let state = market().await;
    let owner = client(&state).await;
    let mut slugs = Vec::new();
    for _ in 0..3 {
        let id = job(&state, &owner, "Book Cover!").await;
        let post = state.post_service.get(PostRef::Job(id)).await.unwrap();
        slugs.push(post.slug().to_string());
    }
    assert_eq!(slugs, vec!["book-cover", "book-cover-1", "book-cover-2"]);
}

#[tokio::test]
async fn applicants_withdraw_only_undecided_applications() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let a2 = artist(&state, "Grace").await;
    let job_id = job(&state, &owner, "Logo").await;
    let kept = apply(&state, &a1, job_id).await;
    let withdrawn = apply(&state, &a2, job_id).await;

    state
        .application_service
        .withdraw(&a2.identity, withdrawn.id)
        .await
        .unwrap();
    state
        .application_service
        .update_status(&owner.identity, kept.id, status("accepted"))
        .await
        .unwrap();
    let err = state
        .application_service
        .withdraw(&a1.identity, kept.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ApplicationLocked(_)));
}

#[tokio::test]
async fn late_applications_cannot_displace_the_accepted_one() {
    let state = market().await;
    let owner = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let a2 = artist(&state, "Grace").await;
    let job_id = job(&state, &owner, "Logo").await;
    let first = apply(&state, &a1, job_id).await;
    state
        .application_service
        .update_status(&owner.identity, first.id, status("accepted"))
        .await
        .unwrap();

    let late = apply(&state, &a2, job_id).await;
    assert_eq!(late.status, ApplicationStatus::Pending);
    let err = state
        .application_service
        .update_status(&owner.identity, late.id, status("accepted"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: ApplicationStatus::Pending,
            to: ApplicationStatus::Accepted,
            ..
        }
    ));

    let all = state
        .application_service
        .list(
            &owner.identity,
            ApplicationListQuery {
                job_post_id: Some(job_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let winners: Vec<i64> = all
        .items
        .iter()
        .filter(|a| a.status == ApplicationStatus::Accepted)
        .map(|a| a.id)
        .collect();
    assert_eq!(winners, vec![first.id]);
    assert_eq!(inbox(&state, &a2).await, Vec::<NotificationType>::new());
}

#[tokio::test]
async fn a_converted_service_offer_stays_the_only_winner() {
    let state = market().await;
    let owner = client(&state).await;
    let seller = artist(&state, "Ada").await;
    let post = state
        .post_service
        .create_availability(
            &seller.identity,
            CreateAvailabilityPostPayload {
                title: "Portrait commissions".into(),
                description: "Painted portraits".into(),
                category: Category::Illustration,
                budget: Decimal::new(120, 0),
            },
        )
        .await
        .unwrap();
    let payload = CreateApplicationPayload {
        application_type: ApplicationType::ClientToService,
        job_post_id: None,
        availability_post_id: Some(post.id),
        artist_id: None,
        client_id: None,
        message: "A portrait of my cat".into(),
        proposed_budget: None,
        proposed_deadline: None,
    };
    let offer = state
        .application_service
        .create(&owner.identity, payload.clone())
        .await
        .unwrap();
    state
        .application_service
        .update_status(&seller.identity, offer.id, status("accepted"))
        .await
        .unwrap();
    state
        .conversion_service
        .convert(&seller.identity, offer.id, ConvertApplicationPayload::default())
        .await
        .unwrap();

    let later = state
        .application_service
        .create(&owner.identity, payload)
        .await
        .unwrap();
    let err = state
        .application_service
        .update_status(&seller.identity, later.id, status("accepted"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn a_job_links_to_at_most_one_open_project() {
    let state = market().await;
    let owner = client(&state).await;
    let job_id = job(&state, &owner, "Book Cover").await;

    state
        .project_service
        .create(&owner.identity, project_payload("Book Cover", Some(job_id)))
        .await
        .unwrap();
    let err = state
        .project_service
        .create(&owner.identity, project_payload("Book Cover again", Some(job_id)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let closed = job(&state, &owner, "Poster").await;
    state
        .post_service
        .set_status(&owner.identity, PostRef::Job(closed), "closed")
        .await
        .unwrap();
    let err = state
        .project_service
        .create(&owner.identity, project_payload("Poster", Some(closed)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let unlinked = state
        .project_service
        .create(&owner.identity, project_payload("Side work", None))
        .await
        .unwrap();
    assert_eq!(unlinked.job_post_id, None);
}

#[tokio::test]
async fn renaming_a_post_moves_its_slug_only_when_the_title_changes() {
    let state = market().await;
    let owner = client(&state).await;
    job(&state, &owner, "Logo").await;
    let renamed = job(&state, &owner, "Book Cover").await;
    let post = PostRef::Job(renamed);

    let updated = state
        .post_service
        .update(
            &owner.identity,
            post,
            UpdatePostPayload {
                title: Some("Logo".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title(), "Logo");
    assert_eq!(updated.slug(), "logo-1");

    let same_title = state
        .post_service
        .update(
            &owner.identity,
            post,
            UpdatePostPayload {
                title: Some("Logo".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same_title.slug(), "logo-1");

    let untitled_edit = state
        .post_service
        .update(
            &owner.identity,
            post,
            UpdatePostPayload {
                description: Some("Vector logo, two colours".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(untitled_edit.slug(), "logo-1");
    assert_eq!(untitled_edit.description(), "Vector logo, two colours");
}

#[tokio::test]
async fn renaming_a_project_moves_its_slug() {
    let state = market().await;
    let owner = client(&state).await;
    state
        .project_service
        .create(&owner.identity, project_payload("Poster", None))
        .await
        .unwrap();
    let flyer = state
        .project_service
        .create(&owner.identity, project_payload("Flyer", None))
        .await
        .unwrap();
    assert_eq!(flyer.slug, "flyer");

    let renamed = state
        .project_service
        .update_title(
            &owner.identity,
            flyer.id,
            UpdateProjectPayload {
                title: "Poster".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.slug, "poster-1");

    let unchanged = state
        .project_service
        .update_title(
            &owner.identity,
            flyer.id,
            UpdateProjectPayload {
                title: "Poster".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.slug, "poster-1");
}

#[tokio::test]
async fn conversion_by_an_outsider_is_forbidden_before_status_checks() {
    let state = market().await;
    let owner = client(&state).await;
    let outsider = client(&state).await;
    let a1 = artist(&state, "Ada").await;
    let job_id = job(&state, &owner, "Logo").await;
    let pending = apply(&state, &a1, job_id).await;

    let err = state
        .conversion_service
        .convert(&outsider.identity, pending.id, ConvertApplicationPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}
