pub trait UserProfileRegistry {
    /// Returns the raw home storage uid recorded for the profile.
    fn home_storage_identity(
        &self,
        domain_id: &str,
        user_profile_name: &str,
    ) -> Result<String, String>;
}
