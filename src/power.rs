use crate::error::QueuerError;
use crate::models::{CecConfig, WolConfig};
use crate::view::{menu_item, ClassList, Element, MENU_ITEM_CLASSES};

const TAB_ACTIVE: &str = "bg-neutral-700";
const TAB_INACTIVE: &str = "bg-neutral-800";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTab {
    Wol,
    Cec,
}

/// Actions offered by the power menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Wake,
    CecPowerStatus,
    CecPowerOn,
    CecPowerOff,
    EditPowerSettings,
}

impl QuickAction {
    pub fn as_str(self) -> &'static str {
        match self {
            QuickAction::Wake => "wake",
            QuickAction::CecPowerStatus => "cec-power-status",
            QuickAction::CecPowerOn => "cec-power-on",
            QuickAction::CecPowerOff => "cec-power-off",
            QuickAction::EditPowerSettings => "edit-power-settings",
        }
    }

    pub fn from_action(s: &str) -> Option<Self> {
        match s {
            "wake" => Some(QuickAction::Wake),
            "cec-power-status" => Some(QuickAction::CecPowerStatus),
            "cec-power-on" => Some(QuickAction::CecPowerOn),
            "cec-power-off" => Some(QuickAction::CecPowerOff),
            "edit-power-settings" => Some(QuickAction::EditPowerSettings),
            _ => None,
        }
    }
}

/// Raw Wake-on-LAN form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WolForm {
    pub alias: String,
    pub iface: String,
    pub mac: String,
    pub port: String,
}

impl WolForm {
    pub fn from_config(wol: &WolConfig) -> Self {
        Self {
            alias: wol.alias.clone(),
            iface: wol.iface.clone(),
            mac: wol.mac.clone(),
            port: wol.port.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.alias, &self.iface, &self.mac, &self.port]
            .iter()
            .all(|f| f.trim().is_empty())
    }

    pub fn to_config(&self) -> Result<WolConfig, QueuerError> {
        if self.is_empty() {
            return Err(QueuerError::EmptyForm("WOL"));
        }
        let port = self
            .port
            .trim()
            .parse::<u16>()
            .map_err(|e| QueuerError::InvalidField {
                field: "port",
                reason: e.to_string(),
            })?;
        Ok(WolConfig::new(
            self.alias.trim(),
            self.iface.trim(),
            self.mac.trim(),
            port,
        ))
    }
}

/// Raw CEC form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CecForm {
    pub alias: String,
    pub device: String,
    pub logical_addr: String,
    pub physical_addr: String,
}

impl CecForm {
    pub fn from_config(cec: &CecConfig) -> Self {
        Self {
            alias: cec.alias.clone(),
            device: cec.device.clone(),
            logical_addr: cec.logical_addr.to_string(),
            physical_addr: cec.physical_addr.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.alias, &self.device, &self.logical_addr, &self.physical_addr]
            .iter()
            .all(|f| f.trim().is_empty())
    }

    pub fn to_config(&self) -> Result<CecConfig, QueuerError> {
        if self.is_empty() {
            return Err(QueuerError::EmptyForm("CEC"));
        }
        let logical_addr = self
            .logical_addr
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|a| *a <= 15)
            .ok_or_else(|| QueuerError::InvalidField {
                field: "logical_addr",
                reason: "must be int 0 - 15".to_string(),
            })?;
        Ok(CecConfig::new(
            self.alias.trim(),
            self.device.trim(),
            logical_addr,
            self.physical_addr.trim(),
        ))
    }
}

/// The two-tab settings form. Only the active tab's form is visible.
#[derive(Debug, Clone)]
pub struct PowerSettingsPanel {
    open: bool,
    active_tab: PowerTab,
    pub wol_form: WolForm,
    pub cec_form: CecForm,
}

impl Default for PowerSettingsPanel {
    fn default() -> Self {
        Self {
            open: false,
            active_tab: PowerTab::Cec,
            wol_form: WolForm::default(),
            cec_form: CecForm::default(),
        }
    }
}

impl PowerSettingsPanel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn active_tab(&self) -> PowerTab {
        self.active_tab
    }

    pub fn switch_tab(&mut self, tab: PowerTab) {
        self.active_tab = tab;
    }

    pub fn tab_classes(&self, tab: PowerTab) -> ClassList {
        let mut classes = ClassList::new(&["px-4", "py-2", "cursor-pointer"]);
        if tab == self.active_tab {
            classes.add(TAB_ACTIVE);
        } else {
            classes.add(TAB_INACTIVE);
        }
        classes
    }

    /// Refresh the form fields from freshly fetched configs. Skipped while the
    /// panel is open so in-progress edits survive background refreshes.
    /// Returns whether the fields were touched.
    pub fn sync_forms(&mut self, wol: Option<&WolConfig>, cec: Option<&CecConfig>) -> bool {
        if self.open {
            return false;
        }
        self.wol_form = wol.map(WolForm::from_config).unwrap_or_default();
        self.cec_form = cec.map(CecForm::from_config).unwrap_or_default();
        true
    }

    pub fn render(&self) -> Element {
        let mut root = Element::new("div", &["power-settings"]);
        if !self.open {
            root.hide();
        }

        let mut tabs = Element::new("div", &["flex", "flex-row"]);
        for (tab, label, id) in [
            (PowerTab::Cec, "CEC", "psdCECTab"),
            (PowerTab::Wol, "Wake On LAN", "psdWOLTab"),
        ] {
            tabs.append(
                Element::with_class_list("div", self.tab_classes(tab))
                    .attr("id", id)
                    .child(label),
            );
        }
        root.append(tabs);

        let mut cec = form("cecSettings", &[
            ("alias", &self.cec_form.alias),
            ("device", &self.cec_form.device),
            ("logical_addr", &self.cec_form.logical_addr),
            ("physical_addr", &self.cec_form.physical_addr),
        ]);
        let mut wol = form("wolSettings", &[
            ("alias", &self.wol_form.alias),
            ("iface", &self.wol_form.iface),
            ("mac", &self.wol_form.mac),
            ("port", &self.wol_form.port),
        ]);
        match self.active_tab {
            PowerTab::Cec => wol.hide(),
            PowerTab::Wol => cec.hide(),
        }
        root.append(cec);
        root.append(wol);
        root
    }
}

fn form(id: &str, fields: &[(&str, &String)]) -> Element {
    let mut form = Element::new("form", &["flex", "flex-col"]).attr("id", id);
    for (name, value) in fields {
        form.append(
            Element::new("input", &[])
                .attr("name", *name)
                .attr("value", value.as_str()),
        );
    }
    form
}

/// Build the power menu from the cached configs: a wake item when WOL is
/// configured, three CEC items when CEC is configured, and always the
/// settings editor.
pub fn render_power_menu(wol: Option<&WolConfig>, cec: Option<&CecConfig>) -> Element {
    let mut menu = Element::new("ul", &["power-settings-menu"]);
    if let Some(wol) = wol {
        menu.append(menu_item(Some("lan"), &wol.alias, QuickAction::Wake.as_str()));
    }
    if cec.is_some() {
        for (label, action) in [
            ("Power Status", QuickAction::CecPowerStatus),
            ("Power On", QuickAction::CecPowerOn),
            ("Power Off", QuickAction::CecPowerOff),
        ] {
            menu.append(menu_item(Some("settings_input_hdmi"), label, action.as_str()));
        }
    }
    menu.append(
        Element::new("li", MENU_ITEM_CLASSES)
            .attr("data-action", QuickAction::EditPowerSettings.as_str())
            .child("Edit Power Settings"),
    );
    menu
}

/// Actions present in a rendered power menu, in order.
pub fn menu_actions(menu: &Element) -> Vec<QuickAction> {
    menu.child_elements()
        .filter_map(|li| li.get_attr("data-action"))
        .filter_map(QuickAction::from_action)
        .collect()
}
