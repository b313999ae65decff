use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Ephemeral per-customer reservation record, stored in the cache.
///
/// `new_ticket_reservations` never holds a zero quantity: an entry that drops
/// to zero is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCart {
    #[serde(default)]
    pub new_ticket_reservations: BTreeMap<i32, u32>,
    #[serde(default)]
    pub resell_reservations: BTreeSet<i32>,
}

impl ReservationCart {
    pub fn is_empty(&self) -> bool {
        self.new_ticket_reservations.is_empty() && self.resell_reservations.is_empty()
    }

    pub fn reserved_quantity(&self, ticket_type_id: i32) -> u32 {
        self.new_ticket_reservations
            .get(&ticket_type_id)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the new quantity held for `ticket_type_id`.
    pub fn add_new_ticket_reservation(
        &mut self,
        ticket_type_id: i32,
        quantity: u32,
    ) -> Result<u32, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::BadRequest(
                "Reservation quantity must be greater than zero".into(),
            ));
        }

        let entry = self
            .new_ticket_reservations
            .entry(ticket_type_id)
            .or_insert(0);

        *entry = entry.checked_add(quantity).ok_or_else(|| {
            ServiceError::BadRequest(format!(
                "Reservation quantity for ticket type {ticket_type_id} is too large"
            ))
        })?;

        Ok(*entry)
    }

    /// Returns the quantity left for `ticket_type_id` after the removal.
    pub fn remove_new_ticket_reservation(
        &mut self,
        ticket_type_id: i32,
        quantity: u32,
    ) -> Result<u32, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::BadRequest(
                "Reservation quantity must be greater than zero".into(),
            ));
        }

        let held = self
            .new_ticket_reservations
            .get(&ticket_type_id)
            .copied()
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No reservation for ticket type {ticket_type_id} in cart"
                ))
            })?;

        if held < quantity {
            return Err(ServiceError::BadRequest(format!(
                "Cannot remove {quantity} tickets of type {ticket_type_id}: only {held} reserved"
            )));
        }

        let remaining = held - quantity;
        if remaining == 0 {
            self.new_ticket_reservations.remove(&ticket_type_id);
        } else {
            self.new_ticket_reservations.insert(ticket_type_id, remaining);
        }

        Ok(remaining)
    }

    /// Returns `false` when the ticket was already in the cart.
    pub fn add_resell_reservation(&mut self, ticket_id: i32) -> bool {
        self.resell_reservations.insert(ticket_id)
    }

    pub fn remove_resell_reservation(&mut self, ticket_id: i32) -> Result<(), ServiceError> {
        if self.resell_reservations.remove(&ticket_id) {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!(
                "Resale ticket {ticket_id} is not in cart"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn add_then_remove_restores_previous_state() {
        let mut cart = ReservationCart::default();
        cart.add_new_ticket_reservation(1, 2).unwrap();
        let before = cart.clone();

        cart.add_new_ticket_reservation(7, 4).unwrap();
        cart.remove_new_ticket_reservation(7, 4).unwrap();

        assert_eq!(cart, before);
        assert!(!cart.new_ticket_reservations.contains_key(&7));
    }

    #[test]
    fn add_accumulates_into_existing_entry() {
        let mut cart = ReservationCart::default();
        cart.add_new_ticket_reservation(3, 1).unwrap();

        assert_eq!(cart.add_new_ticket_reservation(3, 2).unwrap(), 3);
        assert_eq!(cart.reserved_quantity(3), 3);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut cart = ReservationCart::default();

        let err = cart.add_new_ticket_reservation(1, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(cart.is_empty());
    }

    #[test]
    fn removing_more_than_held_leaves_cart_untouched() {
        let mut cart = ReservationCart::default();
        cart.add_new_ticket_reservation(1, 3).unwrap();
        let before = cart.clone();

        let err = cart.remove_new_ticket_reservation(1, 5).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(cart, before);
    }

    #[test]
    fn removing_unknown_entry_is_not_found() {
        let mut cart = ReservationCart::default();

        let err = cart.remove_new_ticket_reservation(9, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn resell_reservations_behave_as_a_set() {
        let mut cart = ReservationCart::default();

        assert!(cart.add_resell_reservation(10));
        assert!(!cart.add_resell_reservation(10));
        assert_eq!(cart.resell_reservations.len(), 1);

        cart.remove_resell_reservation(10).unwrap();
        assert_eq!(
            cart.remove_resell_reservation(10).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn cart_survives_json_with_integer_keys() {
        let mut cart = ReservationCart::default();
        cart.add_new_ticket_reservation(42, 2).unwrap();
        cart.add_resell_reservation(5);

        let json = serde_json::to_string(&cart).unwrap();
        let decoded: ReservationCart = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, cart);
    }
}
