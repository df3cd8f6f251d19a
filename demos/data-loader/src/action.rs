//! Actions
//!
//! Names follow the `[Feature] description` convention; the name of
//! `DataLoad` doubles as the channel its outcome is reported on.

/// Application actions
#[derive(dispatch_bus::Action, Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Intent: fetch data (handled by the data effect)
    #[action(name = "[Data] Load data")]
    DataLoad,

    /// Result: data fetched successfully
    #[action(name = "[Data] Data loaded")]
    DataDidLoad(Vec<u32>),

    /// Stop the runtime
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_bus::Action;

    #[test]
    fn test_load_reports_on_its_own_name() {
        assert_eq!(AppAction::DataLoad.channel(), "[Data] Load data");
        assert_eq!(AppAction::DataDidLoad(vec![]).name(), "[Data] Data loaded");
    }
}
