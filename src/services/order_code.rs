use rand::Rng;

/// Source of the short code customers quote to the restaurant.
pub trait OrderCodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Uniform 4-digit codes in `1000..=9999`. Collisions with earlier orders
/// are possible and not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOrderCode;

impl OrderCodeSource for RandomOrderCode {
    fn next_code(&self) -> String {
        rand::thread_rng().gen_range(1000..=9999).to_string()
    }
}
