pub mod empty_lines;

use super::registry::CopRegistry;

pub fn register_all(registry: &mut CopRegistry) {
    registry.register(Box::new(empty_lines::EmptyLines));
}
