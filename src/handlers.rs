//! One handler per user action.
//!
//! Each handler reads the submitted form state, talks to the
//! [`CatalogStore`] and returns a view model for whatever front end is
//! rendering it. Failures become [`Notice`]s; nothing here panics or bubbles
//! errors to the caller.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{CatalogStore, Frame, Session, Statement, TransactionAware};

/// Bounds of the price slider.
pub const PRICE_MIN: Decimal = Decimal::ZERO;
pub const PRICE_MAX: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MISSING_FIELDS: &str = "Please fill all required fields";
pub const PRODUCT_ADDED: &str = "Product added successfully!";
pub const NO_PRODUCTS: &str = "No products found or unable to fetch products.";
pub const LOGIN_REQUIRED: &str = "Please log in to manage products";
pub const ALREADY_LOGGED_IN: &str = "Already logged in, please log out first";

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    /// True for failures; the front end styles these differently.
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Error(m) => m,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Notice::Success(_) => "success",
            Notice::Info(_) => "info",
            Notice::Error(_) => "error",
        };
        write!(f, "[{label}] {}", self.message())
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// The login page. Empty `notices` means the last attempt succeeded or
/// nothing was submitted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginView {
    pub notices: Vec<Notice>,
}

impl LoginView {
    fn rejected(notices: Vec<Notice>) -> Self {
        Self { notices }
    }
}

/// Check the submitted credentials and log the session in on success.
///
/// A session that is already logged in is left untouched. When the lookup
/// itself fails, the database error is shown ahead of the usual rejection.
pub async fn login(store: &CatalogStore, session: &mut Session, form: &LoginForm) -> LoginView {
    if let Some(current) = session.username() {
        tracing::info!(current, requested = %form.username, "Login rejected, session already active");
        return LoginView::rejected(vec![Notice::Error(ALREADY_LOGGED_IN.into())]);
    }

    match store.check_password(&form.username, &form.password).await {
        Ok(true) => {
            if !session.log_in(form.username.clone()) {
                return LoginView::rejected(vec![Notice::Error(ALREADY_LOGGED_IN.into())]);
            }
            tracing::info!(username = %form.username, "User logged in");
            LoginView::default()
        }
        Ok(false) => {
            tracing::info!(username = %form.username, "Login rejected");
            LoginView::rejected(vec![Notice::Error(INVALID_CREDENTIALS.into())])
        }
        Err(err) => LoginView::rejected(vec![
            Notice::Error(err.to_string()),
            Notice::Error(INVALID_CREDENTIALS.into()),
        ]),
    }
}

/// End the session, if any.
pub fn logout(session: &mut Session) {
    if let Some(username) = session.username() {
        tracing::info!(username, "User logged out");
    }
    session.log_out();
}

// ---------------------------------------------------------------------------
// Product browsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryChoice {
    #[default]
    All,
    Named(String),
}

impl fmt::Display for CategoryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryChoice::All => f.write_str("All"),
            CategoryChoice::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for CategoryChoice {
    fn from(value: &str) -> Self {
        if value == "All" {
            CategoryChoice::All
        } else {
            CategoryChoice::Named(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: CategoryChoice,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl ProductFilter {
    /// Filter with the price range clamped to the slider bounds.
    pub fn new(category: CategoryChoice, min_price: Decimal, max_price: Decimal) -> Self {
        let low = min_price.min(max_price).clamp(PRICE_MIN, PRICE_MAX);
        let high = min_price.max(max_price).clamp(PRICE_MIN, PRICE_MAX);
        Self {
            category,
            min_price: low,
            max_price: high,
        }
    }
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self::new(CategoryChoice::All, PRICE_MIN, PRICE_MAX)
    }
}

/// Build the product listing query for a filter.
pub fn product_query(filter: &ProductFilter) -> Statement {
    let mut statement = Statement::new("SELECT * FROM products WHERE 1=1");

    if let CategoryChoice::Named(category) = &filter.category {
        statement = statement
            .push_sql(" AND category = :category")
            .bind("category", category.as_str());
    }

    statement
        .push_sql(" AND price BETWEEN :min_price AND :max_price")
        .bind("min_price", filter.min_price)
        .bind("max_price", filter.max_price)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPageView {
    pub welcome: String,
    /// Options for the category selector, `All` first.
    pub categories: Vec<CategoryChoice>,
    /// The category actually applied to the listing.
    pub selected_category: CategoryChoice,
    pub products: Option<Arc<Frame>>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Login(LoginView),
    Products(ProductPageView),
}

/// Route to the page matching the session's login state.
pub async fn render(store: &CatalogStore, session: &Session, filter: &ProductFilter) -> Page {
    match product_page(store, session, filter).await {
        Some(view) => Page::Products(view),
        None => Page::Login(LoginView::default()),
    }
}

/// Build the product management page, or `None` when logged out.
pub async fn product_page(
    store: &CatalogStore,
    session: &Session,
    filter: &ProductFilter,
) -> Option<ProductPageView> {
    let username = session.username()?;
    let mut notices = Vec::new();

    let mut categories = vec![CategoryChoice::All];
    let categories_read = store
        .run_query(&Statement::new("SELECT DISTINCT category FROM products"))
        .await;
    match categories_read {
        Ok(frame) if !frame.is_empty() => {
            if let Some(values) = frame.column("category") {
                categories.extend(
                    values
                        .into_iter()
                        .filter_map(|v| v.as_str())
                        .map(|name| CategoryChoice::Named(name.to_string())),
                );
            }
        }
        Ok(_) => {}
        Err(err) => notices.push(Notice::Error(err.to_string())),
    }

    // Without a category list the selector cannot offer anything but All.
    let selected_category = if categories.len() > 1 {
        filter.category.clone()
    } else {
        CategoryChoice::All
    };
    let effective = ProductFilter {
        category: selected_category.clone(),
        ..filter.clone()
    };

    let products = match store.run_query(&product_query(&effective)).await {
        Ok(frame) => Some(frame),
        Err(err) => {
            notices.push(Notice::Error(err.to_string()));
            notices.push(Notice::Info(NO_PRODUCTS.into()));
            None
        }
    };

    Some(ProductPageView {
        welcome: format!("Welcome, {username}!"),
        categories,
        selected_category,
        products,
        notices,
    })
}

// ---------------------------------------------------------------------------
// Product creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewProductForm {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub inventory: u32,
}

impl NewProductForm {
    /// Name and category are non-blank and the price is positive.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.category.trim().is_empty()
            && self.price > Decimal::ZERO
    }
}

/// Insert a product and invalidate cached reads once it commits.
pub async fn add_product(store: &CatalogStore, session: &Session, form: &NewProductForm) -> Notice {
    if !session.is_authenticated() {
        return Notice::Error(LOGIN_REQUIRED.into());
    }
    if !form.is_complete() {
        return Notice::Error(MISSING_FIELDS.into());
    }

    let statement = Statement::new(
        "INSERT INTO products (name, category, price, inventory) \
         VALUES (:name, :category, :price, :inventory)",
    )
    .bind("name", form.name.trim())
    .bind("category", form.category.trim())
    .bind("price", form.price)
    .bind("inventory", form.inventory);

    let cache: Arc<dyn TransactionAware> = store.cache();
    match store.execute_query_notifying(&statement, &[cache]).await {
        Ok(()) => Notice::Success(PRODUCT_ADDED.into()),
        Err(err) => Notice::Error(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn default_filter_spans_the_slider() {
        let filter = ProductFilter::default();
        assert_eq!(filter.category, CategoryChoice::All);
        assert_eq!(filter.min_price, Decimal::ZERO);
        assert_eq!(filter.max_price, Decimal::from(2000));
    }

    #[test]
    fn filter_orders_and_clamps_range() {
        let filter = ProductFilter::new(
            CategoryChoice::All,
            Decimal::from(5000),
            Decimal::from(-10),
        );
        assert_eq!(filter.min_price, Decimal::ZERO);
        assert_eq!(filter.max_price, Decimal::from(2000));
    }

    #[test]
    fn all_categories_query_has_only_price_predicate() {
        let statement = product_query(&ProductFilter::default());
        assert_eq!(
            statement.sql(),
            "SELECT * FROM products WHERE 1=1 AND price BETWEEN :min_price AND :max_price"
        );
        assert!(statement.param("category").is_none());
    }

    #[test]
    fn named_category_adds_predicate() {
        let filter = ProductFilter::new(
            CategoryChoice::from("Electronics"),
            Decimal::from(100),
            Decimal::from(1000),
        );
        let statement = product_query(&filter);
        assert_eq!(
            statement.sql(),
            "SELECT * FROM products WHERE 1=1 AND category = :category \
             AND price BETWEEN :min_price AND :max_price"
        );
        assert_eq!(statement.param("category"), Some(&Value::from("Electronics")));
        assert_eq!(
            statement.param("max_price"),
            Some(&Value::Decimal(Decimal::from(1000)))
        );

        let compiled = statement.compile().unwrap();
        assert_eq!(compiled.values.len(), 3);
    }

    #[test]
    fn category_choice_round_trips_through_text() {
        assert_eq!(CategoryChoice::from("All"), CategoryChoice::All);
        assert_eq!(CategoryChoice::from("Furniture").to_string(), "Furniture");
    }

    #[test]
    fn incomplete_product_forms_are_rejected() {
        let complete = NewProductForm {
            name: "Lamp".into(),
            category: "Furniture".into(),
            price: Decimal::new(2999, 2),
            inventory: 0,
        };
        assert!(complete.is_complete());

        let zero_price = NewProductForm {
            price: Decimal::ZERO,
            ..complete.clone()
        };
        assert!(!zero_price.is_complete());

        let blank_name = NewProductForm {
            name: "  ".into(),
            ..complete
        };
        assert!(!blank_name.is_complete());
    }

    #[test]
    fn notice_display_includes_kind() {
        let notice = Notice::Error(INVALID_CREDENTIALS.into());
        assert!(notice.is_error());
        assert_eq!(notice.to_string(), "[error] Invalid username or password");
    }
}
