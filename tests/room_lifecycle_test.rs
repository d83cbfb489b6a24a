mod common;

use assert_matches::assert_matches;
use common::TestApp;
use hotel_backoffice::errors::ServiceError;
use hotel_backoffice::services::guests::{CheckInInput, GuestFilter, UpdateGuestInput};
use hotel_backoffice::services::rooms::{RoomFilter, UpdateRoomInput};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn check_in_input(name: &str, surname: &str, room_id: Option<Uuid>) -> CheckInInput {
    CheckInInput {
        name: name.to_string(),
        surname: surname.to_string(),
        national_id: None,
        room_id,
        price_paid: None,
    }
}

#[tokio::test]
async fn check_in_then_check_out_flips_room_availability() {
    let app = TestApp::new().await;
    let rooms = app.state.services.rooms.clone();
    let guests = app.state.services.guests.clone();

    let room = app.seed_room("101", dec!(50)).await;
    assert!(room.available);

    let guest = guests
        .check_in(check_in_input("Ana", "Lopez", Some(room.id)))
        .await
        .expect("check in");
    assert_eq!(guest.room_id, Some(room.id));
    assert!(guest.check_out_time.is_none());
    assert!(!rooms.get_room(room.id).await.unwrap().available);

    let checked_out = guests.check_out(guest.id).await.expect("check out");
    assert!(checked_out.check_out_time.is_some());
    assert!(checked_out.check_out_time.unwrap() >= checked_out.check_in_time);
    // The stay keeps its room for history
    assert_eq!(checked_out.room_id, Some(room.id));
    assert!(rooms.get_room(room.id).await.unwrap().available);
}

#[tokio::test]
async fn occupied_room_cannot_be_booked_twice() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();
    let room = app.seed_room("102", dec!(65)).await;

    guests
        .check_in(check_in_input("Ana", "Lopez", Some(room.id)))
        .await
        .unwrap();

    let err = guests
        .check_in(check_in_input("Luis", "Mora", Some(room.id)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::RoomUnavailable(_));

    // The rejected check-in must not leave a guest behind
    let (listed, total) = guests
        .list_guests(GuestFilter::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(listed[0].name, "Ana");
}

#[tokio::test]
async fn check_in_to_unknown_room_is_not_found() {
    let app = TestApp::new().await;
    let err = app
        .state
        .services
        .guests
        .check_in(check_in_input("Ana", "Lopez", Some(Uuid::new_v4())))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn checking_out_a_guest_without_room_changes_nothing() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();

    let guest = guests
        .check_in(check_in_input("Walk", "In", None))
        .await
        .unwrap();
    let after = guests.check_out(guest.id).await.unwrap();

    assert_eq!(after.id, guest.id);
    assert_eq!(after.room_id, None);
    assert!(after.check_out_time.is_none());
}

#[tokio::test]
async fn duplicate_room_numbers_are_rejected() {
    let app = TestApp::new().await;
    let rooms = app.state.services.rooms.clone();
    app.seed_room("201", dec!(80)).await;
    let other = app.seed_room("202", dec!(80)).await;

    let err = rooms
        .create_room(hotel_backoffice::services::rooms::CreateRoomInput {
            number: "201".into(),
            price: dec!(90),
            has_aircon: true,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UniquenessViolation(_));

    let err = rooms
        .update_room(
            other.id,
            UpdateRoomInput {
                number: Some("201".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::UniquenessViolation(_));
}

#[tokio::test]
async fn duplicate_national_ids_are_rejected() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();

    let mut first = check_in_input("Ana", "Lopez", None);
    first.national_id = Some("0912345678".into());
    guests.check_in(first).await.unwrap();

    let mut second = check_in_input("Eva", "Ruiz", None);
    second.national_id = Some("0912345678".into());
    let err = guests.check_in(second).await.unwrap_err();
    assert_matches!(err, ServiceError::UniquenessViolation(_));
}

#[tokio::test]
async fn blank_national_id_update_clears_the_value() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();

    let mut input = check_in_input("Ana", "Lopez", None);
    input.national_id = Some("X123".into());
    let guest = guests.check_in(input).await.unwrap();

    let updated = guests
        .update_guest(
            guest.id,
            UpdateGuestInput {
                national_id: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.national_id, None);
}

#[tokio::test]
async fn available_rooms_exclude_occupied_ones() {
    let app = TestApp::new().await;
    let rooms = app.state.services.rooms.clone();
    let free = app.seed_room("301", dec!(40)).await;
    let taken = app.seed_room("302", dec!(40)).await;

    app.state
        .services
        .guests
        .check_in(check_in_input("Ana", "Lopez", Some(taken.id)))
        .await
        .unwrap();

    let available = rooms.list_available_rooms().await.unwrap();
    assert_eq!(available.iter().map(|r| r.id).collect::<Vec<_>>(), vec![free.id]);

    let (occupied, total) = rooms
        .list_rooms(
            RoomFilter {
                available: Some(false),
                search: None,
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(occupied[0].number, "302");
}

#[tokio::test]
async fn deleting_a_room_keeps_its_guests() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();
    let room = app.seed_room("401", dec!(70)).await;

    let guest = guests
        .check_in(check_in_input("Ana", "Lopez", Some(room.id)))
        .await
        .unwrap();

    app.state.services.rooms.delete_room(room.id).await.unwrap();

    let after = guests.get_guest(guest.id).await.unwrap();
    assert_eq!(after.room_id, None);
    assert_matches!(
        app.state.services.rooms.get_room(room.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn deleting_an_active_guest_frees_the_room() {
    let app = TestApp::new().await;
    let room = app.seed_room("501", dec!(55)).await;
    let guest = app
        .state
        .services
        .guests
        .check_in(check_in_input("Ana", "Lopez", Some(room.id)))
        .await
        .unwrap();

    app.state.services.guests.delete_guest(guest.id).await.unwrap();

    assert!(
        app.state
            .services
            .rooms
            .get_room(room.id)
            .await
            .unwrap()
            .available
    );
}

#[tokio::test]
async fn bulk_check_out_reports_guests_without_rooms_as_skipped() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();
    let room_a = app.seed_room("601", dec!(50)).await;
    let room_b = app.seed_room("602", dec!(50)).await;

    let a = guests
        .check_in(check_in_input("Ana", "Lopez", Some(room_a.id)))
        .await
        .unwrap();
    let b = guests
        .check_in(check_in_input("Luis", "Mora", Some(room_b.id)))
        .await
        .unwrap();
    let walk_in = guests
        .check_in(check_in_input("Eva", "Ruiz", None))
        .await
        .unwrap();

    let result = guests
        .check_out_many(vec![a.id, b.id, walk_in.id, a.id])
        .await
        .unwrap();

    assert_eq!(result.checked_out.len(), 2);
    assert!(result.checked_out.contains(&a.id));
    assert!(result.checked_out.contains(&b.id));
    assert_eq!(result.skipped, vec![walk_in.id]);
    assert_eq!(
        app.state.services.rooms.list_available_rooms().await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn bulk_check_out_with_unknown_guest_changes_nothing() {
    let app = TestApp::new().await;
    let guests = app.state.services.guests.clone();
    let room = app.seed_room("701", dec!(50)).await;
    let guest = guests
        .check_in(check_in_input("Ana", "Lopez", Some(room.id)))
        .await
        .unwrap();

    let err = guests
        .check_out_many(vec![guest.id, Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    assert!(guests.get_guest(guest.id).await.unwrap().is_active());
    assert!(!app.state.services.rooms.get_room(room.id).await.unwrap().available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_check_ins_book_a_room_once() {
    let app = TestApp::with_connection_pool(4).await;
    let room = app.seed_room("204", dec!(70)).await;

    let first = app.state.services.guests.clone();
    let second = app.state.services.guests.clone();
    let room_id = room.id;
    let ana = tokio::spawn(async move {
        first
            .check_in(check_in_input("Ana", "Lopez", Some(room_id)))
            .await
    });
    let luis = tokio::spawn(async move {
        second
            .check_in(check_in_input("Luis", "Mora", Some(room_id)))
            .await
    });
    let outcomes = [
        ana.await.expect("check-in task panicked"),
        luis.await.expect("check-in task panicked"),
    ];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = outcomes
        .into_iter()
        .find_map(Result::err)
        .expect("one check-in must be refused");
    assert_matches!(rejected, ServiceError::RoomUnavailable(_));

    assert!(!app.state.services.rooms.get_room(room_id).await.unwrap().available);
    let (guests, total) = app
        .state
        .services
        .guests
        .list_guests(
            GuestFilter {
                room_id: Some(room_id),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert!(guests[0].is_active());
}
