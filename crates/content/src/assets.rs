//! Asset type tables from the site's catalog API.

// Index is the asset type id; gaps are ids the site never assigned.
const ASSET_TYPE_NAMES: [Option<&str>; 62] = [
    None,
    Some("Image"), Some("TShirt"), Some("Audio"), Some("Mesh"), Some("Lua"),
    Some("HTML"), Some("Text"), Some("Hat"), Some("Place"), Some("Model"),
    Some("Shirt"), Some("Pants"), Some("Decal"), None, None,
    Some("Avatar"), Some("Head"), Some("Face"), Some("Gear"), None,
    Some("Badge"), Some("Group Emblem"), None, Some("Animation"), Some("Arms"),
    Some("Legs"), Some("Torso"), Some("RightArm"), Some("LeftArm"), Some("LeftLeg"),
    Some("RightLeg"), Some("Package"), Some("YouTubeVideo"), Some("Game Pass"), Some("App"),
    None, Some("Code"), Some("Plugin"), Some("SolidModel"), Some("MeshPart"),
    Some("HairAccessory"), Some("FaceAccessory"), Some("NeckAccessory"), Some("ShoulderAccessory"),
    Some("FrontAccessory"), Some("BackAccessory"), Some("WaistAccessory"),
    Some("ClimbAnimation"), Some("DeathAnimation"), Some("FallAnimation"), Some("IdleAnimation"),
    Some("JumpAnimation"), Some("RunAnimation"), Some("SwimAnimation"), Some("WalkAnimation"),
    Some("PoseAnimation"),
    Some("EarAccessory"), Some("EyeAccessory"), None, None,
    Some("EmoteAnimation"),
];

pub const INVALID_EXPLORABLE_ASSET_TYPES: &[u32] = &[1, 3, 4, 5, 6, 7, 16, 21, 22, 32, 33, 34, 35, 37];
pub const INVALID_DOWNLOADABLE_ASSET_TYPES: &[u32] = &[21, 32, 34];
pub const WEARABLE_ASSET_TYPES: &[u32] = &[
    2, 8, 11, 12, 17, 18, 27, 28, 29, 30, 31, 41, 42, 43, 44, 45, 46, 47,
];
pub const ANIMATION_PREVIEW_ASSET_TYPES: &[u32] = &[24, 48, 49, 50, 51, 52, 53, 54, 55, 56, 61];

pub fn asset_type_name(id: u32) -> Option<&'static str> {
    ASSET_TYPE_NAMES.get(id as usize).copied().flatten()
}

/// Instance inside a container model that holds the real content id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerAsset {
    pub class_name: &'static str,
    pub prop: &'static str,
}

pub fn container_asset_type(id: u32) -> Option<ContainerAsset> {
    let (class_name, prop) = match id {
        2 => ("ShirtGraphic", "Graphic"),
        11 => ("Shirt", "ShirtTemplate"),
        12 => ("Pants", "PantsTemplate"),
        13 | 18 => ("Decal", "Texture"),
        40 => ("MeshPart", "MeshID"),
        61 => ("Animation", "AnimationId"),
        _ => return None,
    };
    Some(ContainerAsset { class_name, prop })
}

pub fn prohibited_reason(code: &str) -> Option<&'static str> {
    Some(match code {
        "UniverseDoesNotHaveARootPlace" => "This game has no root place.",
        "UniverseRootPlaceIsNotActive" => "This game is not active",
        "InsufficientPermissionFriendsOnly" => "This game is friends only.",
        "InsufficientPermissionGroupOnly" => "Group members only.",
        "UnderReview" => "This game is under moderation review.",
        _ => return None,
    })
}

/// File extension for a downloaded asset, sniffed from its bytes when given.
pub fn asset_file_type(asset_type_id: u32, buffer: Option<&[u8]>) -> &'static str {
    // Binary place/model files carry `<roblox!` as their magic.
    let is_xml = buffer.is_some_and(|b| b.get(7) != Some(&b'!'));
    match asset_type_id {
        1 => match buffer.and_then(|b| b.first().copied()) {
            Some(0xFF) => "jpg",
            Some(0x4D | 0x49) => "tif",
            Some(0x47) => "gif",
            Some(0x42) => "bmp",
            _ => "png",
        },
        3 => match buffer.and_then(|b| b.get(..4)) {
            Some(b"RIFF") => "wav",
            Some(b"OggS") => "ogg",
            _ => "mp3",
        },
        4 => "mesh",
        9 if is_xml => "rbxlx",
        9 => "rbxl",
        _ if is_xml => "rbxmx",
        _ => "rbxm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_skip_unassigned_ids() {
        assert_eq!(asset_type_name(1), Some("Image"));
        assert_eq!(asset_type_name(34), Some("Game Pass"));
        assert_eq!(asset_type_name(61), Some("EmoteAnimation"));
        assert_eq!(asset_type_name(14), None);
        assert_eq!(asset_type_name(0), None);
        assert_eq!(asset_type_name(62), None);
    }

    #[test]
    fn container_lookup() {
        assert_eq!(
            container_asset_type(18),
            Some(ContainerAsset {
                class_name: "Decal",
                prop: "Texture"
            })
        );
        assert_eq!(container_asset_type(8), None);
        assert!(WEARABLE_ASSET_TYPES.contains(&8));
    }

    fn sniff(asset_type_id: u32, bytes: &[u8]) -> &'static str {
        asset_file_type(asset_type_id, Some(bytes))
    }

    #[test]
    fn sniffs_file_types() {
        assert_eq!(sniff(1, &[0xFF, 0xD8]), "jpg");
        assert_eq!(sniff(1, &[0x00]), "png");
        assert_eq!(asset_file_type(1, None), "png");
        assert_eq!(sniff(3, b"OggS...."), "ogg");
        assert_eq!(sniff(3, b"ID3"), "mp3");
        assert_eq!(asset_file_type(4, None), "mesh");
        assert_eq!(sniff(9, b"<roblox!\x89"), "rbxl");
        assert_eq!(sniff(9, b"<roblox xmlns"), "rbxlx");
        assert_eq!(asset_file_type(10, None), "rbxm");
        assert_eq!(sniff(10, b"<roblox "), "rbxmx");
        assert_eq!(prohibited_reason("UnderReview"), Some("This game is under moderation review."));
    }
}
