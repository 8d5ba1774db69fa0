/// 16 random bytes as 32 lowercase hex characters.
pub fn generate_node_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
