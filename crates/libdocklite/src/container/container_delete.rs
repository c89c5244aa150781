use std::fs;

use super::Container;
use crate::error::LibdockliteError;

impl Container {
    /// Stops the container if needed and removes its directory, including
    /// the rootfs and logs
    ///
    /// # Example
    ///
    /// ```no_run
    /// use libdocklite::container::ContainerRegistry;
    ///
    /// # fn main() -> Result<(), libdocklite::error::LibdockliteError> {
    /// let registry = ContainerRegistry::new("/var/docklite");
    /// let mut container = registry.get("74f1a4cb3801")?;
    /// container.delete()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn delete(&mut self) -> Result<(), LibdockliteError> {
        self.stop()?;
        tracing::debug!(id = self.id(), root = ?self.root, "removing container directory");

        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|err| {
                tracing::error!(?err, path = ?self.root, "failed to remove container directory");
                LibdockliteError::RemoveDir {
                    path: self.root.to_owned(),
                    source: err,
                }
            })?;
        }

        Ok(())
    }
}
