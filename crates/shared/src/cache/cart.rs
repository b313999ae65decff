use crate::{cache::CacheStore, errors::ServiceError, model::ReservationCart};
use std::time::Duration;
use tracing::{debug, error, info};

pub const CART_KEY_PREFIX: &str = "cart:";

/// Reservation carts keyed by customer email.
///
/// Writes are plain overwrites: two concurrent mutations of the same cart
/// race and the last write wins. Carts of different customers never contend.
#[derive(Clone)]
pub struct CartStore {
    cache: CacheStore,
    ttl: Duration,
}

impl CartStore {
    pub fn new(cache: CacheStore, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn cart_key(customer_email: &str) -> String {
        format!("{CART_KEY_PREFIX}{customer_email}")
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetches the cart, or an empty one when none is stored. A stored cart
    /// gets its expiry pushed back to the full TTL.
    pub async fn get_cart(&self, customer_email: &str) -> Result<ReservationCart, ServiceError> {
        let key = Self::cart_key(customer_email);

        let cart = self
            .cache
            .get_object::<ReservationCart>(&key)
            .await
            .map_err(|e| {
                error!("❌ Failed to load cart for {customer_email}: {e}");
                ServiceError::Internal(format!("Failed to load cart: {e}"))
            })?;

        match cart {
            Some(cart) => {
                self.cache.expire_key(&key, self.ttl).await.map_err(|e| {
                    error!("❌ Failed to refresh cart TTL for {customer_email}: {e}");
                    ServiceError::Internal(format!("Failed to refresh cart: {e}"))
                })?;
                debug!("Cart loaded for {customer_email}");
                Ok(cart)
            }
            None => {
                debug!("No cart stored for {customer_email}, starting empty");
                Ok(ReservationCart::default())
            }
        }
    }

    pub async fn save_cart(
        &self,
        customer_email: &str,
        cart: &ReservationCart,
    ) -> Result<(), ServiceError> {
        let key = Self::cart_key(customer_email);

        self.cache
            .set_object(&key, cart, Some(self.ttl))
            .await
            .map_err(|e| {
                error!("❌ Failed to save cart for {customer_email}: {e}");
                ServiceError::Internal(format!("Failed to save cart: {e}"))
            })
    }

    pub async fn add_new_ticket_reservation(
        &self,
        customer_email: &str,
        ticket_type_id: i32,
        quantity: u32,
    ) -> Result<ReservationCart, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::BadRequest(
                "Reservation quantity must be greater than zero".into(),
            ));
        }

        let mut cart = self.get_cart(customer_email).await?;
        let held = cart.add_new_ticket_reservation(ticket_type_id, quantity)?;
        self.save_cart(customer_email, &cart).await?;

        info!("🛒 {customer_email} now holds {held} of ticket type {ticket_type_id}");
        Ok(cart)
    }

    pub async fn remove_new_ticket_reservation(
        &self,
        customer_email: &str,
        ticket_type_id: i32,
        quantity: u32,
    ) -> Result<ReservationCart, ServiceError> {
        let mut cart = self.get_cart(customer_email).await?;
        let remaining = cart.remove_new_ticket_reservation(ticket_type_id, quantity)?;
        self.save_cart(customer_email, &cart).await?;

        info!("🛒 {customer_email} released {quantity} of ticket type {ticket_type_id}, {remaining} left");
        Ok(cart)
    }

    pub async fn add_resell_reservation(
        &self,
        customer_email: &str,
        ticket_id: i32,
    ) -> Result<ReservationCart, ServiceError> {
        let mut cart = self.get_cart(customer_email).await?;
        if !cart.add_resell_reservation(ticket_id) {
            debug!("Resale ticket {ticket_id} already in cart of {customer_email}");
        }
        self.save_cart(customer_email, &cart).await?;

        Ok(cart)
    }

    pub async fn remove_resell_reservation(
        &self,
        customer_email: &str,
        ticket_id: i32,
    ) -> Result<ReservationCart, ServiceError> {
        let mut cart = self.get_cart(customer_email).await?;
        cart.remove_resell_reservation(ticket_id)?;
        self.save_cart(customer_email, &cart).await?;

        Ok(cart)
    }

    pub async fn clear_cart(&self, customer_email: &str) -> Result<(), ServiceError> {
        self.cache
            .delete_key(&Self::cart_key(customer_email))
            .await
            .map_err(|e| {
                error!("❌ Failed to clear cart for {customer_email}: {e}");
                ServiceError::Internal(format!("Failed to clear cart: {e}"))
            })?;

        info!("🧹 Cart cleared for {customer_email}");
        Ok(())
    }

    /// Customer emails of every cart currently alive in the cache.
    pub async fn list_customers(&self) -> Result<Vec<String>, ServiceError> {
        let keys = self
            .cache
            .list_keys_by_prefix(CART_KEY_PREFIX)
            .await
            .map_err(ServiceError::from)?;

        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(CART_KEY_PREFIX).map(str::to_string))
            .collect())
    }

    /// Loads a cart without touching its TTL, so background readers do not
    /// keep abandoned carts alive. `None` when the cart has expired.
    pub async fn peek_cart(
        &self,
        customer_email: &str,
    ) -> Result<Option<ReservationCart>, ServiceError> {
        self.cache
            .get_object::<ReservationCart>(&Self::cart_key(customer_email))
            .await
            .map_err(ServiceError::from)
    }
}
