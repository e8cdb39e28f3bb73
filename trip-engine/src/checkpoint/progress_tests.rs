//! Unit tests for trip progression.

use super::*;
use crate::geo::Coordinate;
use crate::itinerary::{Composer, ItineraryError, LocationPoint, Place};
use chrono::{DateTime, TimeZone, Utc};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
}

fn point(order: usize, lat: f64, lng: f64) -> LocationPoint {
    LocationPoint::from_place(order, Place::new(format!("P{order}"), "", coord(lat, lng)))
}

/// Three stops roughly 11 km apart along a meridian.
fn three_stops() -> Vec<LocationPoint> {
    vec![
        point(0, 10.0, 106.0),
        point(1, 10.1, 106.0),
        point(2, 10.2, 106.0),
    ]
}

fn trip() -> TripProgress {
    TripProgress::initialize(RequestId::new("REQ-1"), three_stops(), Vec::new()).unwrap()
}

fn images(n: usize) -> Vec<ImageRef> {
    (0..n).map(|i| ImageRef::new(format!("img-{i}"))).collect()
}

/// An attempt roughly 0.1 km north of the given location.
fn near(location: &LocationPoint) -> CheckInAttempt {
    let c = location.coordinate;
    CheckInAttempt::new(coord(c.latitude() + 0.0009, c.longitude()), images(1), "ok")
}

fn checkpoint(order: usize) -> Checkpoint {
    Checkpoint {
        order,
        reported_coordinate: coord(10.0, 106.0),
        timestamp: at(),
        images: images(1),
        note: String::new(),
    }
}

#[test]
fn initialize_fresh() {
    let trip = trip();

    assert_eq!(trip.current_index(), 0);
    assert!(!trip.is_completed());
    assert!(trip.checkpoints().is_empty());
    assert_eq!(trip.state(), TripState::NotStarted);
    assert_eq!(trip.remaining(), 3);
    assert_eq!(trip.current_target().unwrap().order, 0);
    assert_eq!(trip.request_id().as_str(), "REQ-1");
}

#[test]
fn initialize_rejects_short_itinerary() {
    let result = TripProgress::initialize(RequestId::new("R"), vec![point(0, 0.0, 0.0)], vec![]);
    assert_eq!(result, Err(CheckInError::EmptyItinerary { count: 1 }));

    let result = TripProgress::initialize(RequestId::new("R"), vec![], vec![]);
    assert_eq!(result, Err(CheckInError::EmptyItinerary { count: 0 }));
}

#[test]
fn initialize_rejects_duplicate_orders() {
    let locations = vec![point(0, 10.0, 106.0), point(0, 10.1, 106.0), point(1, 10.2, 106.0)];
    let result = TripProgress::initialize(RequestId::new("R"), locations, vec![]);

    assert_eq!(
        result,
        Err(CheckInError::InvalidItinerary(ItineraryError::DuplicateOrder(0)))
    );
}

#[test]
fn initialize_rejects_gapped_orders() {
    let locations = vec![point(0, 10.0, 106.0), point(2, 10.2, 106.0)];
    let result = TripProgress::initialize(RequestId::new("R"), locations, vec![]);

    assert_eq!(
        result,
        Err(CheckInError::InvalidItinerary(ItineraryError::MissingOrder(1)))
    );
}

#[test]
fn initialize_sorts_locations() {
    let mut locations = three_stops();
    locations.reverse();
    let trip = TripProgress::initialize(RequestId::new("R"), locations, vec![]).unwrap();

    let orders: Vec<_> = trip.locations().iter().map(|l| l.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn initialize_resumes_from_checkpoints() {
    let trip = TripProgress::initialize(
        RequestId::new("R"),
        three_stops(),
        vec![checkpoint(1), checkpoint(0)],
    )
    .unwrap();

    assert_eq!(trip.current_index(), 2);
    assert_eq!(trip.state(), TripState::InProgress { current_index: 2 });
    assert_eq!(trip.current_target().unwrap().order, 2);
    assert_eq!(trip.remaining(), 1);
}

#[test]
fn initialize_resumes_completed_trip() {
    let trip = TripProgress::initialize(
        RequestId::new("R"),
        three_stops(),
        vec![checkpoint(0), checkpoint(1), checkpoint(2)],
    )
    .unwrap();

    assert!(trip.is_completed());
    assert_eq!(trip.state(), TripState::Completed);
    assert_eq!(trip.current_index(), 2);
    assert_eq!(trip.current_target(), Err(CheckInError::AlreadyCompleted));
}

#[test]
fn initialize_rejects_skipped_checkpoint() {
    let result =
        TripProgress::initialize(RequestId::new("R"), three_stops(), vec![checkpoint(1)]);
    assert_eq!(
        result,
        Err(CheckInError::UnexpectedCheckpoint {
            order: 1,
            expected: 0
        })
    );
}

#[test]
fn initialize_rejects_too_many_checkpoints() {
    let result = TripProgress::initialize(
        RequestId::new("R"),
        three_stops(),
        vec![checkpoint(0), checkpoint(1), checkpoint(2), checkpoint(3)],
    );
    assert_eq!(
        result,
        Err(CheckInError::UnexpectedCheckpoint {
            order: 3,
            expected: 3
        })
    );
}

#[test]
fn for_itinerary_uses_finalized_order() {
    let mut composer = Composer::new();
    composer.set_origin(Place::new("A", "", coord(10.0, 106.0)));
    composer.add_stop("b");
    composer.resolve_stop(1, Place::new("B", "", coord(10.1, 106.0))).unwrap();
    composer.set_destination(Place::new("C", "", coord(10.2, 106.0)));
    let itinerary = composer.finalize().unwrap();

    let trip = TripProgress::for_itinerary(RequestId::new("R"), &itinerary, vec![]).unwrap();
    assert_eq!(trip.locations().len(), 3);
    assert_eq!(trip.current_target().unwrap().name, "A");
}

#[test]
fn out_of_geofence_is_rejected_without_change() {
    let mut trip = trip();
    let before = trip.clone();

    // About 50 km south of the origin
    let attempt = CheckInAttempt::new(coord(9.55, 106.0), images(1), "");
    let err = trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap_err();

    match err {
        CheckInError::OutOfGeofence {
            distance_km,
            limit_km,
        } => {
            assert!((distance_km - 50.0).abs() < 1.0, "got {distance_km}");
            assert_eq!(limit_km, 5.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(trip.current_index(), 0);
    assert_eq!(trip, before);
}

#[test]
fn accepted_check_in_advances() {
    let mut trip = trip();
    let attempt = near(&trip.locations()[0]);

    let receipt = trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap();

    assert_eq!(receipt.checkpoint.order, 0);
    assert_eq!(receipt.checkpoint.timestamp, at());
    assert_eq!(receipt.checkpoint.images, images(1));
    assert_eq!(receipt.checkpoint.note, "ok");
    assert_eq!(receipt.progress.current_index(), 1);
    assert_eq!(trip.current_index(), 1);
    assert_eq!(trip.checkpoint(0), Some(&receipt.checkpoint));
    assert_eq!(trip.state(), TripState::InProgress { current_index: 1 });
}

#[test]
fn evidence_missing() {
    let mut trip = trip();
    let mut attempt = near(&trip.locations()[0]);
    attempt.images.clear();

    assert_eq!(
        trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap_err(),
        CheckInError::EvidenceMissing
    );
    assert!(trip.checkpoints().is_empty());
}

#[test]
fn evidence_limit_exceeded() {
    let mut trip = trip();
    let mut attempt = near(&trip.locations()[0]);
    attempt.images = images(3);

    assert_eq!(
        trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap_err(),
        CheckInError::EvidenceLimitExceeded { count: 3, limit: 2 }
    );
    assert_eq!(trip.current_index(), 0);
}

#[test]
fn two_images_accepted() {
    let mut trip = trip();
    let mut attempt = near(&trip.locations()[0]);
    attempt.images = images(2);

    let receipt = trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap();
    assert_eq!(receipt.checkpoint.images.len(), 2);
}

#[test]
fn evidence_checked_before_geofence() {
    let mut trip = trip();
    let attempt = CheckInAttempt::new(coord(0.0, 0.0), Vec::new(), "");

    assert_eq!(
        trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap_err(),
        CheckInError::EvidenceMissing
    );
}

#[test]
fn boundary_distance_is_accepted() {
    let mut trip = trip();
    let attempt = near(&trip.locations()[0]);
    let d = crate::geo::distance_km(&trip.locations()[0].coordinate, &attempt.reported_coordinate);

    assert!(trip.attempt_check_in_at(&attempt, d, at()).is_ok());
}

#[test]
fn invalid_radius_is_rejected_without_change() {
    let mut trip = trip();
    let before = trip.clone();
    let far = CheckInAttempt::new(coord(-45.0, -70.0), images(1), "");

    let err = trip.attempt_check_in_at(&far, f64::NAN, at()).unwrap_err();
    assert!(matches!(err, CheckInError::InvalidRadius { radius_km } if radius_km.is_nan()));

    let close = near(&trip.locations()[0]);
    let err = trip.attempt_check_in_at(&close, -1.0, at()).unwrap_err();
    assert_eq!(err, CheckInError::InvalidRadius { radius_km: -1.0 });

    let err = trip.attempt_check_in_at(&far, f64::INFINITY, at()).unwrap_err();
    assert_eq!(err, CheckInError::InvalidRadius { radius_km: f64::INFINITY });

    assert_eq!(trip, before);
}

#[test]
fn full_trip_completes_then_rejects() {
    let mut trip = trip();

    for idx in 0..3 {
        let attempt = near(&trip.locations()[idx]);
        let receipt = trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap();
        assert_eq!(receipt.checkpoint.order, idx);
    }

    assert!(trip.is_completed());
    assert_eq!(trip.state(), TripState::Completed);
    assert_eq!(trip.current_index(), 2);
    assert_eq!(trip.checkpoints().len(), 3);
    assert_eq!(trip.remaining(), 0);

    let attempt = near(&trip.locations()[2]);
    let before = trip.clone();
    assert_eq!(
        trip.attempt_check_in_at(&attempt, 5.0, at()).unwrap_err(),
        CheckInError::AlreadyCompleted
    );
    assert_eq!(trip, before);
    assert_eq!(trip.current_target(), Err(CheckInError::AlreadyCompleted));
}

#[test]
fn check_in_at_wrong_stop_is_rejected() {
    let mut trip = trip();
    // Standing at stop 1 while stop 0 is expected
    let attempt = near(&trip.locations()[1]);

    assert!(matches!(
        trip.attempt_check_in_at(&attempt, 5.0, at()),
        Err(CheckInError::OutOfGeofence { .. })
    ));
    assert_eq!(trip.current_index(), 0);
}

#[test]
fn validate_does_not_mutate() {
    let trip = trip();
    let attempt = near(&trip.locations()[0]);

    let checkpoint = trip.validate_check_in(&attempt, 5.0, at()).unwrap();
    assert_eq!(checkpoint.order, 0);
    assert!(trip.checkpoints().is_empty());
    assert_eq!(trip.current_index(), 0);
}

#[test]
fn record_rejects_checkpoint_for_other_order() {
    let mut trip = trip();
    assert_eq!(
        trip.record(checkpoint(1)).unwrap_err(),
        CheckInError::UnexpectedCheckpoint {
            order: 1,
            expected: 0
        }
    );
    assert!(trip.checkpoints().is_empty());
}

#[test]
fn resume_then_finish() {
    let mut first = trip();
    let attempt = near(&first.locations()[0]);
    let receipt = first.attempt_check_in_at(&attempt, 5.0, at()).unwrap();

    // Simulate restart: rebuild from what was persisted
    let mut resumed =
        TripProgress::initialize(RequestId::new("REQ-1"), three_stops(), vec![receipt.checkpoint])
            .unwrap();
    assert_eq!(resumed.current_index(), 1);

    for idx in 1..3 {
        let attempt = near(&resumed.locations()[idx]);
        resumed.attempt_check_in_at(&attempt, 5.0, at()).unwrap();
    }
    assert!(resumed.is_completed());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Near { images: usize },
        Far { images: usize },
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0usize..4).prop_map(|images| Step::Near { images }),
            (0usize..4).prop_map(|images| Step::Far { images }),
        ]
    }

    proptest! {
        /// current_index never decreases, rejected attempts change nothing,
        /// and a completed trip stays completed
        #[test]
        fn monotonic_and_side_effect_free(steps in proptest::collection::vec(step(), 0..30)) {
            let mut trip = trip();
            for step in steps {
                let before = trip.clone();
                let target = trip.locations()[trip.current_index()].coordinate;
                let attempt = match step {
                    Step::Near { images: n } => {
                        CheckInAttempt::new(coord(target.latitude() + 0.0009, target.longitude()), images(n), "")
                    }
                    Step::Far { images: n } => {
                        CheckInAttempt::new(coord(target.latitude() - 1.0, target.longitude()), images(n), "")
                    }
                };

                match trip.attempt_check_in_at(&attempt, 5.0, at()) {
                    Ok(receipt) => {
                        prop_assert!(!before.is_completed());
                        prop_assert_eq!(trip.checkpoints().len(), before.checkpoints().len() + 1);
                        prop_assert_eq!(&receipt.progress, &trip);
                    }
                    Err(_) => prop_assert_eq!(&trip, &before),
                }

                prop_assert!(trip.current_index() >= before.current_index());
                if before.is_completed() {
                    prop_assert!(trip.is_completed());
                }
                prop_assert_eq!(trip.is_completed(), trip.checkpoints().contains_key(&2));
            }
        }
    }
}
