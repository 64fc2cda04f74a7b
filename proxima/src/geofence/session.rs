//! Geofence session state machine.

use std::fmt;

use thiserror::Error;
use tracing::{debug, error};

use crate::coord::{distance_meters, Coordinate};

/// A pick that fell outside the geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceRejected {
    /// The point the user picked.
    pub point: Coordinate,
    /// Distance from the armed center to the point.
    pub distance_meters: f64,
    /// Radius the session was armed with.
    pub allowed_radius: f64,
}

impl GeofenceRejected {
    /// How far beyond the allowed radius the pick landed.
    pub fn overage_meters(&self) -> f64 {
        self.distance_meters - self.allowed_radius
    }
}

impl fmt::Display for GeofenceRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "too far by {:.0}m ({:.0}m away, must be within {:.0}m)",
            self.overage_meters(),
            self.distance_meters,
            self.allowed_radius
        )
    }
}

/// Result of evaluating a pick against an armed session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeofenceOutcome {
    Accepted(Coordinate),
    Rejected(GeofenceRejected),
}

impl GeofenceOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GeofenceOutcome::Accepted(_))
    }
}

/// Session state.
///
/// The center and radius are captured when the session is armed and kept
/// through every later evaluation until `disarm()`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GeofenceState {
    #[default]
    Inactive,
    Armed {
        center: Coordinate,
        radius_meters: f64,
    },
    Accepted {
        center: Coordinate,
        radius_meters: f64,
        point: Coordinate,
    },
    Rejected {
        center: Coordinate,
        radius_meters: f64,
        point: Coordinate,
        distance_meters: f64,
    },
}

impl GeofenceState {
    fn name(&self) -> &'static str {
        match self {
            GeofenceState::Inactive => "inactive",
            GeofenceState::Armed { .. } => "armed",
            GeofenceState::Accepted { .. } => "accepted",
            GeofenceState::Rejected { .. } => "rejected",
        }
    }

    /// The frozen center and radius, unless inactive.
    pub fn fence(&self) -> Option<(Coordinate, f64)> {
        match *self {
            GeofenceState::Inactive => None,
            GeofenceState::Armed {
                center,
                radius_meters,
            }
            | GeofenceState::Accepted {
                center,
                radius_meters,
                ..
            }
            | GeofenceState::Rejected {
                center,
                radius_meters,
                ..
            } => Some((center, radius_meters)),
        }
    }
}

/// Errors from misusing a geofence session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    /// Operation not allowed in the current state.
    #[error("cannot {operation} a geofence session that is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Radius must be a finite, non-negative number of meters.
    #[error("invalid geofence radius: {0}")]
    InvalidRadius(f64),
}

/// Gates a map pick behind "within R meters of where the user stood when
/// the session was armed".
#[derive(Debug, Clone, Default)]
pub struct GeofenceSession {
    state: GeofenceState,
}

impl GeofenceSession {
    /// Create an inactive session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the session around `center`.
    ///
    /// Only valid while inactive; call [`disarm`](Self::disarm) first to
    /// re-center.
    pub fn arm(&mut self, center: Coordinate, radius_meters: f64) -> Result<(), GeofenceError> {
        if !matches!(self.state, GeofenceState::Inactive) {
            return Err(self.invalid("arm"));
        }
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(GeofenceError::InvalidRadius(radius_meters));
        }

        debug!(%center, radius_m = radius_meters, "Geofence armed");
        self.state = GeofenceState::Armed {
            center,
            radius_meters,
        };
        Ok(())
    }

    /// Evaluate a picked point against the frozen center.
    ///
    /// Valid once armed, including after a previous acceptance or rejection,
    /// so the user can keep picking until a point is accepted.
    pub fn evaluate(&mut self, point: Coordinate) -> Result<GeofenceOutcome, GeofenceError> {
        let (center, radius_meters) = self.state.fence().ok_or_else(|| self.invalid("evaluate"))?;

        let distance = distance_meters(&center, &point);
        if distance <= radius_meters {
            debug!(%point, distance_m = distance, "Geofence pick accepted");
            self.state = GeofenceState::Accepted {
                center,
                radius_meters,
                point,
            };
            Ok(GeofenceOutcome::Accepted(point))
        } else {
            debug!(%point, distance_m = distance, radius_m = radius_meters, "Geofence pick rejected");
            self.state = GeofenceState::Rejected {
                center,
                radius_meters,
                point,
                distance_meters: distance,
            };
            Ok(GeofenceOutcome::Rejected(GeofenceRejected {
                point,
                distance_meters: distance,
                allowed_radius: radius_meters,
            }))
        }
    }

    /// Return to inactive from any state.
    pub fn disarm(&mut self) {
        if !matches!(self.state, GeofenceState::Inactive) {
            debug!("Geofence disarmed");
        }
        self.state = GeofenceState::Inactive;
    }

    pub fn state(&self) -> &GeofenceState {
        &self.state
    }

    /// The accepted point, if the last evaluation succeeded.
    pub fn accepted_point(&self) -> Option<Coordinate> {
        match self.state {
            GeofenceState::Accepted { point, .. } => Some(point),
            _ => None,
        }
    }

    fn invalid(&self, operation: &'static str) -> GeofenceError {
        let state = self.state.name();
        error!(operation, state, "Geofence session misuse");
        GeofenceError::InvalidState { operation, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::offset_north;

    fn center() -> Coordinate {
        Coordinate::new(19.40, -99.10).with_accuracy(6.0)
    }

    fn armed(radius: f64) -> GeofenceSession {
        let mut session = GeofenceSession::new();
        session.arm(center(), radius).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_inactive() {
        let session = GeofenceSession::new();
        assert_eq!(*session.state(), GeofenceState::Inactive);
        assert_eq!(session.accepted_point(), None);
    }

    #[test]
    fn test_point_inside_radius_is_accepted() {
        let mut session = armed(30.0);
        let point = offset_north(&center(), 20.0);

        let outcome = session.evaluate(point).unwrap();

        assert_eq!(outcome, GeofenceOutcome::Accepted(point));
        assert_eq!(session.accepted_point(), Some(point));
    }

    #[test]
    fn test_point_on_boundary_is_accepted() {
        let mut session = armed(30.0);
        let point = offset_north(&center(), 29.999);
        assert!(session.evaluate(point).unwrap().is_accepted());
    }

    #[test]
    fn test_point_outside_radius_is_rejected_with_distance() {
        let mut session = armed(30.0);
        let point = offset_north(&center(), 45.0);

        let outcome = session.evaluate(point).unwrap();

        let GeofenceOutcome::Rejected(rejection) = outcome else {
            panic!("Expected rejection, got {:?}", outcome);
        };
        assert_eq!(rejection.distance_meters, distance_meters(&center(), &point));
        assert_eq!(rejection.allowed_radius, 30.0);
        assert!((rejection.overage_meters() - 15.0).abs() < 0.01);
        assert!(matches!(
            session.state(),
            GeofenceState::Rejected { point: p, .. } if *p == point
        ));
    }

    #[test]
    fn test_retry_after_rejection_uses_same_center() {
        let mut session = armed(30.0);

        let far = offset_north(&center(), 45.0);
        assert!(!session.evaluate(far).unwrap().is_accepted());

        let near = offset_north(&center(), 10.0);
        assert!(session.evaluate(near).unwrap().is_accepted());
        assert_eq!(session.state().fence(), Some((center(), 30.0)));
    }

    #[test]
    fn test_center_is_frozen_when_live_position_moves() {
        let mut session = armed(30.0);

        // The user drifts 25m north after arming; a pick 40m north of the
        // original center is only 15m from the new live position.
        let live = offset_north(&center(), 25.0);
        let pick = offset_north(&center(), 40.0);
        assert!(distance_meters(&live, &pick) < 30.0);

        let first = session.evaluate(pick).unwrap();
        let second = session.evaluate(pick).unwrap();

        assert!(!first.is_accepted());
        assert_eq!(first, second);
        assert_eq!(session.state().fence(), Some((center(), 30.0)));
    }

    #[test]
    fn test_evaluate_while_inactive_is_invalid() {
        let mut session = GeofenceSession::new();
        let result = session.evaluate(center());
        assert_eq!(
            result,
            Err(GeofenceError::InvalidState {
                operation: "evaluate",
                state: "inactive",
            })
        );
    }

    #[test]
    fn test_arm_twice_is_invalid() {
        let mut session = armed(30.0);
        let result = session.arm(center(), 10.0);
        assert!(matches!(
            result,
            Err(GeofenceError::InvalidState { operation: "arm", .. })
        ));
        assert_eq!(session.state().fence(), Some((center(), 30.0)));
    }

    #[test]
    fn test_arm_after_decision_requires_disarm() {
        let mut session = armed(30.0);
        session.evaluate(center()).unwrap();
        assert!(session.arm(center(), 30.0).is_err());

        session.disarm();
        assert!(session.arm(offset_north(&center(), 100.0), 30.0).is_ok());
    }

    #[test]
    fn test_invalid_radius() {
        let mut session = GeofenceSession::new();
        assert_eq!(
            session.arm(center(), -1.0),
            Err(GeofenceError::InvalidRadius(-1.0))
        );
        assert!(session.arm(center(), f64::NAN).is_err());
        assert_eq!(*session.state(), GeofenceState::Inactive);
    }

    #[test]
    fn test_disarm_is_idempotent() {
        let mut session = armed(30.0);
        session.disarm();
        session.disarm();
        assert_eq!(*session.state(), GeofenceState::Inactive);
    }

    #[test]
    fn test_rejection_display() {
        let rejection = GeofenceRejected {
            point: center(),
            distance_meters: 45.2,
            allowed_radius: 30.0,
        };
        assert_eq!(
            rejection.to_string(),
            "too far by 15m (45m away, must be within 30m)"
        );
    }
}
