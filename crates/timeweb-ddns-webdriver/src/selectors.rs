//! DOM selectors for the hosting panel
//!
//! The panel has no stable test ids, so these follow its markup. If the panel
//! changes, this is the only file that should need to.

/// Link that only renders for a logged-in user
pub const AUTH_MARKER_CSS: &str = "a[href='/domains']";

pub const LOGIN_FIELD_NAME: &str = "username";
pub const PASSWORD_FIELD_NAME: &str = "password";
pub const SUBMIT_BUTTON_CSS: &str = "button[type='submit']";

/// Edit button inside a record row
pub const EDIT_BUTTON_CSS: &str = "button.js-edit-record";

/// The "edit A-record" dialog
pub const EDIT_MODAL_XPATH: &str =
    "//div[contains(@class, 'k-window') and contains(., 'Редактировать A-запись')]";

/// The value input inside the dialog, whichever of the two widgets is visible
pub const VALUE_INPUT_XPATH: &str = ".//input[contains(@class, 'cpS-combobox-input') or (@name='value' and not(contains(@style,'display: none')))]";

pub const CONFIRM_BUTTON_CSS: &str = "button.js-confirm";
pub const CANCEL_BUTTON_CSS: &str = "button.js-confirm-not";

/// Value cell of a record row
pub const VALUE_CELL_XPATH: &str = "./td[3]";

/// Table row whose name column is `fqdn` and type column is `A`
pub fn record_row_xpath(fqdn: &str) -> String {
    format!(
        "//tr[td[1][normalize-space()='{}'] and td[2][normalize-space()='A']]",
        fqdn
    )
}
