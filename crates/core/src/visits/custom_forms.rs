//! Custom form steps: define a form on the admin page, attach it to a lab
//! request, fill it, and check it on the report.

use crate::error::HarnessResult;
use crate::harness::Harness;

pub const FIELD_LABEL: &str = "Test Field";
pub const FIELD_VALUE: &str = "Test Value";

pub fn custom_form_name(form_type: &str, always_included: bool) -> String {
    let included = if always_included { "included" } else { "NOT included" };
    format!("Test Custom Form for {} {}", form_type, included)
}

fn form_field(name: &str) -> String {
    format!(
        ".custom-form[data-test-custom-form=\"{}\"] .custom-form-field input",
        name
    )
}

/// Create a custom form with a single text field and save it.
pub fn create_custom_form_for_type(
    h: &mut Harness<'_>,
    form_type: &str,
    always_included: bool,
) -> HarnessResult<()> {
    let name = custom_form_name(form_type, always_included);
    h.visit("/admin/custom-forms/edit/new")?;
    h.assert_text(".view-current-title", "New Custom Form", "New custom form title displays")?;

    h.fill_in(".custom-form-name input", &name)?;
    h.select(".custom-form-type select", form_type)?;
    if always_included {
        h.toggle(".custom-form-always-include input")?;
    }

    h.click("button:contains(Add Field)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Add Field", "Add Field dialog displays")?;
    h.fill_in(".custom-field-label input", FIELD_LABEL)?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.assert_exists(
        format!("td.custom-field-name:contains({})", FIELD_LABEL),
        "New field appears",
    )?;

    h.click(".panel-footer button:contains(Add)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Form Saved", "Form Saved dialog displays")?;
    h.click(".modal-footer button:contains(Ok)")?;
    h.wait_to_disappear(".modal-dialog")?;
    Ok(())
}

/// Pick a form in the "Add Form" dialog of a request.
pub fn attach_custom_form(h: &mut Harness<'_>, name: &str) -> HarnessResult<()> {
    h.click("button:contains(Add Form)")?;
    h.wait_to_appear(".modal-dialog")?;
    h.assert_text(".modal-title", "Add Custom Form", "Add Custom Form dialog displays")?;

    h.select(".custom-form-select select", name)?;
    h.click(".modal-footer button:contains(Add)")?;
    h.wait_to_disappear(".modal-dialog")?;
    h.wait_to_appear(format!(".custom-form[data-test-custom-form=\"{}\"]", name))?;
    Ok(())
}

pub fn fill_custom_form(h: &mut Harness<'_>, name: &str) -> HarnessResult<()> {
    h.fill_in(form_field(name), FIELD_VALUE)
}

pub fn check_custom_form_is_filled_and_readonly(
    h: &mut Harness<'_>,
    name: &str,
) -> HarnessResult<()> {
    let field = form_field(name);
    h.assert_value(&field, FIELD_VALUE, &format!("{} value is shown", name))?;
    h.assert_disabled(&field, &format!("{} is read only", name))
}
