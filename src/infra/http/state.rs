use std::sync::Arc;

use crate::application::articles::ArticleService;
use crate::application::publish::PublishService;

#[derive(Clone)]
pub struct HttpState {
    pub articles: Arc<ArticleService>,
    pub publish: Arc<PublishService>,
}
