pub mod duplicate_regexp_character_class_element;
pub mod mixed_regexp_capture_types;

use super::registry::CopRegistry;

pub fn register_all(registry: &mut CopRegistry) {
    registry.register(Box::new(
        duplicate_regexp_character_class_element::DuplicateRegexpCharacterClassElement,
    ));
    registry.register(Box::new(mixed_regexp_capture_types::MixedRegexpCaptureTypes));
}
