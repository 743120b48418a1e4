//! Endpoint paths and the [`ServiceDeskApi`] implementation for [`ApiClient`].

use async_trait::async_trait;

use super::types::{AddCommentRequestBody, CreateTicketRequestBody, RequestBodyBase, SetPushTokenBody};
use super::upload::upload_form;
use super::{ApiClient, ApiResult, ProgressCallback, ServiceDeskApi};
use crate::data::TicketId;
use crate::files::FileUploadData;

const GET_TICKET_FEED: &str = "getticketfeed";
const GET_TICKETS: &str = "gettickets";
const GET_TICKET: &str = "getticket";
const ADD_COMMENT: &str = "addcomment";
const ADD_FEED_COMMENT: &str = "addfeedcomment";
const CREATE_TICKET: &str = "createticket";
const UPLOAD_FILE: &str = "uploadfile";
const SET_PUSH_TOKEN: &str = "setpushtoken";

#[async_trait]
impl ServiceDeskApi for ApiClient {
    async fn get_ticket_feed(&self, body: &RequestBodyBase) -> ApiResult {
        self.post_json(GET_TICKET_FEED, body).await
    }

    async fn get_tickets(&self, body: &RequestBodyBase) -> ApiResult {
        self.post_json(GET_TICKETS, body).await
    }

    async fn get_ticket(&self, body: &RequestBodyBase, ticket_id: TicketId) -> ApiResult {
        self.post_json(&format!("{}/{}", GET_TICKET, ticket_id), body)
            .await
    }

    async fn add_comment(&self, body: &AddCommentRequestBody, ticket_id: TicketId) -> ApiResult {
        self.post_json(&format!("{}/{}", ADD_COMMENT, ticket_id), body)
            .await
    }

    async fn add_feed_comment(&self, body: &AddCommentRequestBody) -> ApiResult {
        self.post_json(ADD_FEED_COMMENT, body).await
    }

    async fn create_ticket(&self, body: &CreateTicketRequestBody) -> ApiResult {
        self.post_json(CREATE_TICKET, body).await
    }

    async fn upload_file(&self, file: FileUploadData, progress: Option<ProgressCallback>) -> ApiResult {
        let form = upload_form(file, progress)?;
        self.post_multipart(UPLOAD_FILE, form).await
    }

    async fn set_push_token(&self, body: &SetPushTokenBody) -> ApiResult {
        self.post_json(SET_PUSH_TOKEN, body).await
    }
}
