pub mod time;

/// Globally unique id for workflows and stored records.
pub fn longid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Short id for nodes and edges, unique within one workflow.
pub fn shortid() -> String {
    nanoid::nanoid!(12)
}
