pub mod capture;
pub mod generate;
pub mod webhooks;

pub async fn index() -> &'static str {
    "hook-inspector"
}
