pub mod auth;
pub mod books;
pub mod reviews;

use std::sync::Arc;

use bookly_kernel::ModuleRegistry;
use bookly_mail::MailClient;

/// Build the shared stores and register the three resource modules.
/// Registration order is also mounting order: books, auths, reviews.
pub fn register_all(registry: &mut ModuleRegistry, mail: Arc<MailClient>) {
    let books = Arc::new(books::store::BookStore::new());
    let reviews = Arc::new(reviews::store::ReviewStore::new());
    let users = Arc::new(auth::store::UserStore::new());

    registry.register(Arc::new(books::BooksModule::new(
        books.clone(),
        reviews.clone(),
    )));
    registry.register(Arc::new(auth::AuthModule::new(users, mail)));
    registry.register(Arc::new(reviews::ReviewsModule::new(books, reviews)));
}
