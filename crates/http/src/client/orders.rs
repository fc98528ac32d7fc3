//! Orders, hosted checkout and admin audit log endpoints

use super::ClientError;
use super::typed::{AuthenticatedTrekClient, execute_message, segment};
use crate::types::{
    AdminLog, AdminLogRequest, CheckoutOrder, CheckoutRequest, MessageResponse, Order,
    PaymentStatus, PaymentStatusUpdate, PaymentVerification,
};
use reqwest::Method;

impl AuthenticatedTrekClient {
    /// Create a gateway order for a package
    ///
    /// The returned order id and minor-unit amount are what the hosted checkout
    /// widget needs; after the user pays, pass the widget's callback fields to
    /// [`Self::verify_payment`].
    pub async fn start_checkout(
        &self,
        package_id: impl Into<String>,
        amount: f64,
    ) -> Result<CheckoutOrder, ClientError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ClientError::Configuration(format!(
                "checkout amount must be positive, got {amount}"
            )));
        }

        let req = self
            .request(Method::POST, "/orders/create-order")
            .json(&CheckoutRequest {
                package_id: package_id.into(),
                amount,
            });
        self.execute(req).await
    }

    /// Have the backend check the gateway signature and activate the purchase
    pub async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<MessageResponse, ClientError> {
        let req = self
            .request(Method::POST, "/orders/verify")
            .json(verification);
        execute_message(req).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        let req = self.request(Method::GET, "/orders");
        self.execute(req).await
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, ClientError> {
        let req = self.request(Method::GET, &format!("/orders/{}", segment(id)));
        self.execute(req).await
    }

    pub async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<Order, ClientError> {
        let req = self
            .request(Method::PATCH, &format!("/orders/{}/status", segment(id)))
            .json(&PaymentStatusUpdate { status });
        self.execute(req).await
    }

    /// Record an admin action in the audit log
    pub async fn log_admin_action(
        &self,
        action_type: impl Into<String>,
        description: Option<String>,
    ) -> Result<AdminLog, ClientError> {
        let req = self
            .request(Method::POST, "/adminLogs/log")
            .json(&AdminLogRequest {
                action_type: action_type.into(),
                description,
            });
        self.execute(req).await
    }

    pub async fn list_admin_logs(&self) -> Result<Vec<AdminLog>, ClientError> {
        let req = self.request(Method::GET, "/adminLogs/logs");
        self.execute(req).await
    }

    pub async fn admin_logs_for(&self, admin_id: &str) -> Result<Vec<AdminLog>, ClientError> {
        let req = self.request(Method::GET, &format!("/adminLogs/logs/{}", segment(admin_id)));
        self.execute(req).await
    }
}
