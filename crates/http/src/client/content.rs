//! Content endpoints: blogs, events, packages, registrations, contacts, newsletter
//!
//! Read-only public listings live on [`PublicTrekClient`]. Admin CRUD lives on
//! [`AuthenticatedTrekClient`]; the API decides authorization from the token's
//! role, so a non-admin token gets `ClientError::Forbidden`.

use super::ClientError;
use super::typed::{AuthenticatedTrekClient, PublicTrekClient, execute_message, segment};
use crate::types::{
    Blog, BlogInput, BlogPatch, BlogSearchField, Contact, ContactPatch, Event, EventBatchUpdate,
    EventInput, EventStatus, IdsRequest, MessageResponse, NewsletterSubscription, Package,
    PackageInput, PackagePatch, PackageSearchField, Registration, RegistrationChange,
    RegistrationCount, RegistrationField, RegistrationInput, RegistrationPatch,
    RegistrationStatus, SubscribeRequest,
};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;

/// Render a search enum the way the API expects it in a query string
fn field_name<T: Serialize>(field: T) -> Result<String, ClientError> {
    match serde_json::to_value(field)? {
        serde_json::Value::String(name) => Ok(name),
        other => Ok(other.to_string()),
    }
}

impl PublicTrekClient {
    /// Published, non-deleted blogs
    pub async fn list_published_blogs(&self) -> Result<Vec<Blog>, ClientError> {
        let req = self.request(Method::GET, "/blogs/list");
        self.execute(req).await
    }

    /// A published blog by id
    pub async fn get_blog(&self, id: &str) -> Result<Blog, ClientError> {
        let req = self.request(Method::GET, &format!("/blogs/{}", segment(id)));
        self.execute(req).await
    }

    /// Published blogs where `field` equals `value`
    pub async fn search_blogs(
        &self,
        field: BlogSearchField,
        value: &str,
    ) -> Result<Vec<Blog>, ClientError> {
        let field = field_name(field)?;
        let req = self
            .request(Method::GET, "/blogs/search")
            .query(&[("field", field.as_str()), ("value", value)]);
        self.execute(req).await
    }

    /// Published events
    pub async fn list_published_events(&self) -> Result<Vec<Event>, ClientError> {
        let req = self.request(Method::GET, "/events");
        self.execute(req).await
    }

    /// Active packages shown on the pricing page
    pub async fn list_public_packages(&self) -> Result<Vec<Package>, ClientError> {
        let req = self.request(Method::GET, "/packages/public");
        self.execute(req).await
    }

    /// Active packages where `field` equals `value`
    pub async fn search_public_packages(
        &self,
        field: PackageSearchField,
        value: &str,
    ) -> Result<Vec<Package>, ClientError> {
        if field == PackageSearchField::IsActive {
            return Err(ClientError::Configuration(
                "public package search cannot filter on is_active".into(),
            ));
        }
        let field = field_name(field)?;
        let req = self
            .request(Method::GET, "/packages/public/search")
            .query(&[("field", field.as_str()), ("value", value)]);
        self.execute(req).await
    }

    /// Registrations where `field` equals `value`
    pub async fn find_registrations(
        &self,
        field: RegistrationField,
        value: &str,
    ) -> Result<Vec<Registration>, ClientError> {
        let field = field_name(field)?;
        let req = self
            .request(Method::GET, "/registrations")
            .query(&[("field", field.as_str()), ("value", value)]);
        self.execute(req).await
    }

    /// How many attendees hold `status` for a package
    pub async fn count_registrations(
        &self,
        package_id: &str,
        status: RegistrationStatus,
    ) -> Result<RegistrationCount, ClientError> {
        let status = field_name(status)?;
        let req = self
            .request(Method::GET, "/registrations/count")
            .query(&[("package_id", package_id), ("status", status.as_str())]);
        self.execute(req).await
    }

    /// Submit the contact form
    pub async fn submit_contact(&self, contact: &Contact) -> Result<Contact, ClientError> {
        let req = self.request(Method::POST, "/contacts").json(contact);
        self.execute(req).await
    }

    /// Subscribe an email address to the newsletter
    pub async fn subscribe_newsletter(
        &self,
        email: impl Into<String>,
    ) -> Result<NewsletterSubscription, ClientError> {
        let req = self
            .request(Method::POST, "/newsletters")
            .json(&SubscribeRequest {
                email: email.into(),
            });
        self.execute(req).await
    }
}

impl AuthenticatedTrekClient {
    // Blogs

    /// Every blog regardless of status
    pub async fn list_all_blogs(&self) -> Result<Vec<Blog>, ClientError> {
        let req = self.request(Method::GET, "/blogs");
        self.execute(req).await
    }

    /// A blog by id in any status
    pub async fn get_blog(&self, id: &str) -> Result<Blog, ClientError> {
        let req = self.request(Method::GET, &format!("/blogs/{}", segment(id)));
        self.execute(req).await
    }

    /// Blogs in any status where `field` equals `value`
    pub async fn search_blogs(
        &self,
        field: BlogSearchField,
        value: &str,
    ) -> Result<Vec<Blog>, ClientError> {
        let field = field_name(field)?;
        let req = self
            .request(Method::GET, "/blogs/search")
            .query(&[("field", field.as_str()), ("value", value)]);
        self.execute(req).await
    }

    pub async fn create_blog(&self, input: &BlogInput) -> Result<Blog, ClientError> {
        let req = self.request(Method::POST, "/blogs").json(input);
        self.execute(req).await
    }

    pub async fn edit_blog(&self, id: &str, patch: &BlogPatch) -> Result<Blog, ClientError> {
        let req = self.request(Method::PUT, &format!("/blogs/{}", segment(id))).json(patch);
        self.execute(req).await
    }

    pub async fn archive_blogs(&self, ids: Vec<String>) -> Result<MessageResponse, ClientError> {
        let req = self
            .request(Method::PUT, "/blogs/archive")
            .json(&IdsRequest { ids });
        execute_message(req).await
    }

    pub async fn reactivate_blog(&self, id: &str) -> Result<Blog, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/blogs/{}/reactivate", segment(id)))
            .json(&json!({}));
        self.execute(req).await
    }

    // Events

    pub async fn list_events_by_status(
        &self,
        status: EventStatus,
    ) -> Result<Vec<Event>, ClientError> {
        let status = field_name(status)?;
        let req = self
            .request(Method::GET, "/events")
            .query(&[("status", status.as_str())]);
        self.execute(req).await
    }

    pub async fn create_event(&self, input: &EventInput) -> Result<Event, ClientError> {
        let req = self.request(Method::POST, "/events").json(input);
        self.execute(req).await
    }

    pub async fn update_event(&self, id: &str, input: &EventInput) -> Result<Event, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/events/{}", segment(id)))
            .json(input);
        self.execute(req).await
    }

    /// Apply the same field changes to several events at once
    pub async fn batch_update_events(
        &self,
        update: &EventBatchUpdate,
    ) -> Result<MessageResponse, ClientError> {
        if update.ids.is_empty() {
            return Err(ClientError::Configuration(
                "batch update needs at least one event id".into(),
            ));
        }
        let req = self.request(Method::PUT, "/events/batch").json(update);
        execute_message(req).await
    }

    pub async fn reactivate_event(&self, id: &str) -> Result<Event, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/events/{}/reactivate", segment(id)))
            .json(&json!({}));
        self.execute(req).await
    }

    // Packages

    pub async fn list_all_packages(&self) -> Result<Vec<Package>, ClientError> {
        let req = self.request(Method::GET, "/packages");
        self.execute(req).await
    }

    pub async fn search_packages(
        &self,
        field: PackageSearchField,
        value: &str,
    ) -> Result<Vec<Package>, ClientError> {
        let field = field_name(field)?;
        let req = self
            .request(Method::GET, "/packages/search")
            .query(&[("field", field.as_str()), ("value", value)]);
        self.execute(req).await
    }

    pub async fn create_package(&self, input: &PackageInput) -> Result<Package, ClientError> {
        let req = self.request(Method::POST, "/packages").json(input);
        self.execute(req).await
    }

    pub async fn update_package(
        &self,
        id: &str,
        patch: &PackagePatch,
    ) -> Result<Package, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/packages/{}", segment(id)))
            .json(patch);
        self.execute(req).await
    }

    /// Soft-delete a package so it disappears from the pricing page
    pub async fn deactivate_package(&self, id: &str) -> Result<Package, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/packages/{}/deactivate", segment(id)))
            .json(&json!({}));
        self.execute(req).await
    }

    pub async fn reactivate_package(&self, id: &str) -> Result<Package, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/packages/{}/reactivate", segment(id)))
            .json(&json!({}));
        self.execute(req).await
    }

    // Registrations

    pub async fn create_registration(
        &self,
        input: &RegistrationInput,
    ) -> Result<Registration, ClientError> {
        let req = self.request(Method::POST, "/registrations").json(input);
        self.execute(req).await
    }

    pub async fn update_registration(
        &self,
        id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Registration, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/registrations/{}", segment(id)))
            .json(patch);
        self.execute(req).await
    }

    /// Cancel using the token mailed to the attendee
    pub async fn cancel_registration(
        &self,
        registration_token: &str,
    ) -> Result<RegistrationChange, ClientError> {
        let req = self
            .request(
                Method::POST,
                &format!("/registrations/cancel/{}", segment(registration_token)),
            )
            .json(&json!({}));
        self.execute(req).await
    }

    /// Registrations owned by the token's subject
    pub async fn my_registrations(&self) -> Result<Vec<Registration>, ClientError> {
        let req = self.request(Method::GET, "/registrations/user");
        self.execute(req).await
    }

    /// Move the first waitlisted attendee of a package into a seat
    pub async fn promote_next_waitlisted(
        &self,
        package_id: &str,
    ) -> Result<RegistrationChange, ClientError> {
        let req = self
            .request(Method::POST, &format!("/registrations/promote/{}", segment(package_id)))
            .json(&json!({}));
        self.execute(req).await
    }

    // Contacts and newsletter

    pub async fn list_contacts(&self) -> Result<Vec<Contact>, ClientError> {
        let req = self.request(Method::GET, "/contacts");
        self.execute(req).await
    }

    pub async fn update_contact(
        &self,
        id: &str,
        patch: &ContactPatch,
    ) -> Result<Contact, ClientError> {
        let req = self
            .request(Method::PUT, &format!("/contacts/{}", segment(id)))
            .json(patch);
        self.execute(req).await
    }

    pub async fn list_newsletter_subscriptions(
        &self,
    ) -> Result<Vec<NewsletterSubscription>, ClientError> {
        let req = self.request(Method::GET, "/newsletters");
        self.execute(req).await
    }
}
