tonic::include_proto!("garbage_service");

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("garbage");
