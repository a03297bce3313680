use async_trait::async_trait;

use crate::engine::{HolidayOracle, NewSession, OverlapOracle, SessionStore, TemplateLookup};
use crate::model::*;

use super::{Store, StoreError};

#[async_trait]
impl TemplateLookup for Store {
    async fn find_template(
        &self,
        template_id: TemplateId,
        center_id: CenterId,
    ) -> Result<Option<Template>, StoreError> {
        Ok(self.template_for_center(template_id, center_id))
    }
}

#[async_trait]
impl HolidayOracle for Store {
    async fn is_holiday(&self, center_id: CenterId, at: Ms) -> Result<bool, StoreError> {
        Ok(self.holiday_at(center_id, at).await.is_some())
    }
}

#[async_trait]
impl OverlapOracle for Store {
    async fn has_overlap(&self, center_id: CenterId, span: Span) -> Result<bool, StoreError> {
        Ok(self.first_overlap(center_id, &span).await.is_some())
    }
}

#[async_trait]
impl SessionStore for Store {
    async fn create_session(&self, session: NewSession) -> Result<ClassSession, StoreError> {
        self.insert_session(session).await
    }
}
