//! Fixed field-name registry.
//!
//! These strings are the exact column/keys used by the source datasets and by
//! the knowledge-store document, so they are spelled exactly as they appear on
//! the wire (hyphens and spaces included).

// ============================================================================
// Record fields
// ============================================================================

pub const TASK: &str = "task";
pub const TASK_PRODUCT: &str = "taskProduct";
pub const ENHANCEMENT: &str = "enhancement";
pub const ENHANCEMENT_ORDER: &str = "enhancement-order";
pub const INPUTS: &str = "inputs";
pub const OUTPUTS: &str = "outputs";
pub const RESPONSIBILITY_OPTIONS: &str = "responsibility_options";
pub const SERVICE: &str = "Service";

pub const RESPONSIBILITY_SPECIFICATION: &str = "responsibility specification (Task:Responsibility)";
pub const TRANSFORMATION_SPECIFICATION: &str = "transformation specification (taskProduct:task)";
pub const ENHANCEMENT_MEDIUM_SPECIFICATION: &str =
    "enhancement medium specification (enhancement:taskProduct)";

/// Fields that always decode to a sequence when un-flattening.
pub const ARRAY_FIELDS: [&str; 4] = [INPUTS, OUTPUTS, RESPONSIBILITY_OPTIONS, ENHANCEMENT_ORDER];

/// Fields checked by simple-field validation, in the order they are visited.
pub const SIMPLE_VALIDATED_FIELDS: [&str; 7] = [
    INPUTS,
    OUTPUTS,
    ENHANCEMENT,
    ENHANCEMENT_ORDER,
    RESPONSIBILITY_OPTIONS,
    TASK,
    TASK_PRODUCT,
];

/// Compound specification fields, in the order they are visited.
pub const COMPOUND_FIELDS: [&str; 3] = [
    RESPONSIBILITY_SPECIFICATION,
    TRANSFORMATION_SPECIFICATION,
    ENHANCEMENT_MEDIUM_SPECIFICATION,
];

// ============================================================================
// Knowledge-store reserved keys
// ============================================================================

pub const TASK_RESPONSIBILITIES: &str = "task_responsibilities";
pub const TASK_PRODUCT_PRODUCERS: &str = "taskProduct_producers";
pub const TASK_PRODUCT_ENHANCEMENTS: &str = "taskProduct_enhancements";
pub const SERVICE_SPECIFICATIONS: &str = "service_specifications";

pub const RESERVED_STORE_KEYS: [&str; 4] = [
    TASK_RESPONSIBILITIES,
    TASK_PRODUCT_PRODUCERS,
    TASK_PRODUCT_ENHANCEMENTS,
    SERVICE_SPECIFICATIONS,
];

// ============================================================================
// Dataset identifiers
// ============================================================================

pub const DATASET_TASK_PRODUCTS: &str = "task-products";
pub const DATASET_TASKS: &str = "tasks";
pub const DATASET_SERVICES: &str = "services";

// ============================================================================
// Separators
// ============================================================================

/// Joins nested keys when flattening (`parent.child`).
pub const PATH_SEPARATOR: &str = ".";
/// Joins sequence elements into one flat cell; un-flattening splits on it.
pub const ARRAY_SEPARATOR: &str = ", ";

pub fn is_array_field(name: &str) -> bool {
    ARRAY_FIELDS.contains(&name)
}

/// The knowledge-store option set a validated field is checked against.
///
/// `inputs`/`outputs` hold task-product names, so they share its option set.
pub fn option_source(field: &str) -> &str {
    match field {
        INPUTS | OUTPUTS => TASK_PRODUCT,
        other => other,
    }
}

/// Hyphen-to-underscore alias tried when the literal name has no options.
pub fn normalized_alias(field: &str) -> Option<String> {
    field.contains('-').then(|| field.replace('-', "_"))
}
